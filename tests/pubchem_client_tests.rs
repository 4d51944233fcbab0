//! PubChem client against a local stand-in server.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use safechem::clients::pubchem::{ChemicalSource, PubChemClient};
use safechem::clients::{ClientError, build_http_client};
use safechem::models::Category;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}

fn client_for(base: &str, timeout: Duration) -> PubChemClient {
    let http = build_http_client(timeout).expect("failed to build client");
    PubChemClient::with_client(http, &format!("{base}/rest/pug"), &format!("{base}/rest/pug_view"))
}

fn compound(cid: u64, formula: &str, weight: &str) -> Value {
    json!({
        "id": { "id": { "cid": cid } },
        "props": [
            { "urn": { "label": "Molecular Formula" }, "value": { "sval": formula } },
            { "urn": { "label": "Molecular Weight" }, "value": { "sval": weight } },
            { "urn": { "label": "IUPAC Name", "name": "Preferred" }, "value": { "sval": "propan-2-one" } },
            { "urn": { "label": "SMILES" }, "value": { "sval": "CC(=O)C" } }
        ]
    })
}

fn router(cas_hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/rest/pug/compound/name/{name}/JSON",
            get(move |Path(name): Path<String>| {
                let cas_hits = cas_hits.clone();
                async move {
                    match name.as_str() {
                        "acetone" => {
                            Json(json!({ "PC_Compounds": [compound(180, "C3H6O", "58.08")] }))
                                .into_response()
                        }
                        "67-64-1" => {
                            cas_hits.fetch_add(1, Ordering::SeqCst);
                            Json(json!({ "PC_Compounds": [compound(180, "C3H6O", "58.08")] }))
                                .into_response()
                        }
                        "slow" => {
                            tokio::time::sleep(Duration::from_secs(2)).await;
                            Json(json!({ "PC_Compounds": [] })).into_response()
                        }
                        _ => (
                            StatusCode::NOT_FOUND,
                            Json(json!({ "Fault": { "Code": "PUGREST.NotFound" } })),
                        )
                            .into_response(),
                    }
                }
            }),
        )
        .route(
            "/rest/pug/compound/cid/{cid}/property/{props}/JSON",
            get(|Path((cid, _props)): Path<(u64, String)>| async move {
                if cid == 500 {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "message": "PubChem is down" })),
                    )
                        .into_response();
                }
                Json(json!({
                    "PropertyTable": { "Properties": [{
                        "CID": cid,
                        "MolecularFormula": "H2O4S",
                        "MolecularWeight": "98.08",
                        "IUPACName": "sulfuric acid"
                    }]}
                }))
                .into_response()
            }),
        )
        .route(
            "/rest/pug_view/data/compound/{cid}/JSON/",
            get(|| async {
                Json(json!({
                    "Record": { "Section": [{
                        "TOCHeading": "Safety and Hazards",
                        "Section": [
                            {
                                "TOCHeading": "GHS Classification",
                                "Information": [
                                    {
                                        "Name": "Pictogram(s)",
                                        "Value": { "StringWithMarkup": [{
                                            "String": "",
                                            "Markup": [{ "Extra": "Flammable" }, { "Extra": "Irritant" }]
                                        }]}
                                    },
                                    {
                                        "Name": "Signal",
                                        "Value": { "StringWithMarkup": [{ "String": "Danger" }] }
                                    },
                                    {
                                        "Name": "GHS Hazard Statements",
                                        "Value": { "StringWithMarkup": [
                                            { "String": "H225: Highly flammable liquid and vapor" },
                                            { "String": "H319: Causes serious eye irritation" }
                                        ]}
                                    }
                                ]
                            },
                            {
                                "TOCHeading": "First Aid Measures",
                                "Information": [{ "Value": { "StringWithMarkup": [{ "String": "Rinse eyes with water." }] } }]
                            },
                            {
                                "TOCHeading": "Handling and Storage",
                                "Information": [
                                    { "Value": { "StringWithMarkup": [{ "String": "Handling: avoid open flames." }] } },
                                    { "Value": { "StringWithMarkup": [{ "String": "Storage: keep container tightly closed." }] } }
                                ]
                            }
                        ]
                    }]}
                }))
            }),
        )
}

async fn setup() -> PubChemClient {
    setup_counting().await.0
}

async fn setup_counting() -> (PubChemClient, Arc<AtomicUsize>) {
    let cas_hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_server(router(cas_hits.clone())).await;
    (client_for(&base, Duration::from_secs(5)), cas_hits)
}

#[tokio::test]
async fn test_search_by_name_maps_compounds() {
    let client = setup().await;

    let compounds = client.search_by_name("acetone").await.unwrap();
    assert_eq!(compounds.len(), 1);
    assert_eq!(compounds[0].cid, 180);
    assert_eq!(compounds[0].molecular_formula, "C3H6O");
    assert!((compounds[0].molecular_weight - 58.08).abs() < 1e-9);

    let chemicals = client.search("acetone").await.unwrap();
    assert_eq!(chemicals[0].id, "pubchem-180");
    assert_eq!(chemicals[0].category, Category::Organic);
    assert!(chemicals[0].description.contains("58.08 g/mol"));
}

#[tokio::test]
async fn test_unknown_name_is_empty_not_an_error() {
    let client = setup().await;
    assert!(client.search_by_name("unobtainium").await.unwrap().is_empty());
    assert!(client.search_by_cas("0-0-0").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cas_query_resolves_in_one_request() {
    let (client, cas_hits) = setup_counting().await;

    let chemicals = client.search("67-64-1").await.unwrap();

    assert_eq!(chemicals.len(), 1);
    assert_eq!(chemicals[0].cas_number, "67-64-1");
    assert_eq!(cas_hits.load(Ordering::SeqCst), 1);

    assert!(client.search("50-00-0").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_safety_data_sections() {
    let client = setup().await;

    let safety = client.safety_data(180).await.unwrap();

    let ghs = safety.ghs_classification.expect("GHS section");
    assert_eq!(ghs.signal_word, "Danger");
    assert_eq!(ghs.pictograms, vec!["Flammable", "Irritant"]);
    assert_eq!(ghs.hazard_statements.len(), 2);
    assert_eq!(
        safety.first_aid.as_deref(),
        Some(&["Rinse eyes with water.".to_string()][..])
    );
    assert_eq!(safety.handling.unwrap().len(), 1);
    assert_eq!(
        safety.storage.unwrap(),
        vec!["Storage: keep container tightly closed."]
    );
    assert!(safety.disposal.is_none());
}

#[tokio::test]
async fn test_properties_and_upstream_errors() {
    let client = setup().await;

    let props = client.properties(1118).await.unwrap().expect("properties");
    assert_eq!(props.molecular_formula.as_deref(), Some("H2O4S"));
    assert_eq!(props.molecular_weight, Some(98.08));

    let err = client.properties(500).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("PubChem is down"));
}

#[tokio::test]
async fn test_slow_responses_time_out() {
    let base = spawn_server(router(Arc::new(AtomicUsize::new(0)))).await;
    let client = client_for(&base, Duration::from_millis(200));

    let err = client.search_by_name("slow").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout), "got {err:?}");
}
