use crate::models::{Category, Chemical};
use crate::state::SharedState;
use crate::validation::validate_search_query;

pub(crate) fn print_chemical(chemical: &Chemical) {
    println!("• {} ({})", chemical.name, chemical.formula);
    let cas = if chemical.cas_number.is_empty() {
        "-"
    } else {
        chemical.cas_number.as_str()
    };
    println!(
        "  CAS: {} | Category: {} | Hazard: {} | ID: {}",
        cas, chemical.category, chemical.hazard_level, chemical.id
    );
}

pub async fn cmd_search(state: &SharedState, query: &str, local_only: bool) -> anyhow::Result<()> {
    if !validate_search_query(query) {
        println!("Invalid search query: {query}");
        return Ok(());
    }

    println!("Searching for: {query}");

    let outcome = if local_only {
        let results = state.catalog.search(query);
        crate::services::SearchState {
            query: query.to_string(),
            has_cached_results: !results.is_empty(),
            results,
            ..Default::default()
        }
    } else {
        state.hybrid_search().search_once(query).await
    };

    state
        .search_history
        .add(query, Some(outcome.results.len()))
        .await;
    state.statistics.increment_search().await;

    if let Some(error) = &outcome.error {
        println!("⚠ PubChem lookup failed: {error}");
    }

    if outcome.results.is_empty() {
        println!("No chemicals found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results ({}):", outcome.results.len());
    println!("{:-<60}", "");

    for chemical in &outcome.results {
        print_chemical(chemical);
        println!();
    }

    println!("To save one: safechem bookmark add <id>");

    Ok(())
}

pub async fn cmd_info(state: &SharedState, id: &str) -> anyhow::Result<()> {
    let Some(chemical) = state.catalog.get(id) else {
        println!("Chemical with ID {id} not found in the catalog.");
        return Ok(());
    };

    state.statistics.increment_chemical_viewed().await;

    println!("Chemical Info");
    println!("{:-<60}", "");
    println!("Name:     {}", chemical.name);
    println!("Formula:  {}", chemical.formula);
    println!("CAS:      {}", chemical.cas_number);
    println!("Category: {}", chemical.category);
    println!("Hazard:   {}", chemical.hazard_level);
    println!(
        "Saved:    {}",
        if state.bookmarks.is_bookmarked(&chemical.id).await {
            "yes"
        } else {
            "no"
        }
    );
    println!();
    println!("{}", chemical.description);

    Ok(())
}

pub async fn cmd_catalog(state: &SharedState, category: Option<Category>) -> anyhow::Result<()> {
    let chemicals = match category {
        Some(category) => state.catalog.by_category(category),
        None => state.catalog.all().to_vec(),
    };

    if chemicals.is_empty() {
        println!("No chemicals in that category.");
        return Ok(());
    }

    for chemical in &chemicals {
        print_chemical(chemical);
    }
    println!("\n{} chemical(s)", chemicals.len());
    Ok(())
}
