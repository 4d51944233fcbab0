use crate::clients::pubchem::image_url;
use crate::state::SharedState;

fn print_section(title: &str, lines: Option<&Vec<String>>) {
    let Some(lines) = lines.filter(|l| !l.is_empty()) else {
        return;
    };
    println!();
    println!("{title}:");
    for line in lines {
        println!("  • {line}");
    }
}

pub async fn cmd_safety(state: &SharedState, cid: u64) -> anyhow::Result<()> {
    println!("Fetching safety data for CID {cid}...");

    let (properties, safety) = tokio::join!(
        state.pubchem.properties(cid),
        state.pubchem.safety_data(cid)
    );

    match properties {
        Ok(Some(props)) => {
            println!();
            println!("Compound");
            println!("{:-<60}", "");
            if let Some(name) = &props.iupac_name {
                println!("IUPAC:    {name}");
            }
            if let Some(formula) = &props.molecular_formula {
                println!("Formula:  {formula}");
            }
            if let Some(weight) = props.molecular_weight {
                println!("Weight:   {weight:.2} g/mol");
            }
            if let Some(smiles) = &props.canonical_smiles {
                println!("SMILES:   {smiles}");
            }
            println!("Image:    {}", image_url(cid, 300));
        }
        Ok(None) => println!("No properties found for CID {cid}"),
        Err(e) => println!("⚠ Failed to fetch properties: {e}"),
    }

    let safety = match safety {
        Ok(data) => data,
        Err(e) => {
            println!("⚠ Failed to fetch safety data: {e}");
            return Ok(());
        }
    };

    state.statistics.increment_chemical_viewed().await;

    if safety.is_empty() {
        println!();
        println!("PubChem has no safety data for this compound.");
        return Ok(());
    }

    if let Some(ghs) = &safety.ghs_classification {
        println!();
        println!("GHS Classification");
        println!("{:-<60}", "");
        if !ghs.signal_word.is_empty() {
            println!("Signal word: {}", ghs.signal_word);
        }
        if !ghs.pictograms.is_empty() {
            println!("Pictograms:  {}", ghs.pictograms.join(", "));
        }
        print_section("Hazard statements", Some(&ghs.hazard_statements));
        print_section(
            "Precautionary statements",
            Some(&ghs.precautionary_statements),
        );
    }

    print_section("Hazards", safety.hazards.as_ref());
    print_section("First aid", safety.first_aid.as_ref());
    print_section("Fire fighting", safety.fire_fighting.as_ref());
    print_section("Handling", safety.handling.as_ref());
    print_section("Storage", safety.storage.as_ref());
    print_section("Disposal", safety.disposal.as_ref());

    Ok(())
}
