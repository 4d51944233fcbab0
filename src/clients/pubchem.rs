//! PubChem PUG REST / PUG View client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::error::{ClientError, ensure_success};
use crate::config::PubChemConfig;
use crate::models::{Category, Chemical, HazardLevel};

const SERVICE: &str = "PubChem";

const SAFETY_HEADINGS: &str = "GHS+Classification,Hazards+Identification,First+Aid+Measures,Fire+Fighting+Measures,Handling+and+Storage,Disposal+Methods";

static CAS_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\d+-\d+-\d+$").expect("valid CAS regex"));

/// `true` for strings shaped like a CAS registry number (`67-64-1`).
#[must_use]
pub fn looks_like_cas(query: &str) -> bool {
    CAS_RE.is_match(query.trim())
}

/// Source of chemicals that lives outside the device.
#[async_trait]
pub trait ChemicalSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Chemical>, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PubChemCompound {
    pub cid: u64,
    pub name: String,
    pub molecular_formula: String,
    pub molecular_weight: f64,
    pub iupac_name: Option<String>,
    pub canonical_smiles: Option<String>,
}

impl PubChemCompound {
    /// Converts a remote hit into the app's chemical record.
    ///
    /// PubChem says nothing about category or hazard level here, so the
    /// category is guessed from the formula and the hazard level is left at
    /// `Moderate` until safety data is fetched.
    #[must_use]
    pub fn into_chemical(self) -> Chemical {
        let category = if formula_has_carbon(&self.molecular_formula) {
            Category::Organic
        } else {
            Category::Inorganic
        };

        let cas_number = if looks_like_cas(&self.name) {
            self.name.trim().to_string()
        } else {
            String::new()
        };

        let mut description = self.iupac_name.clone().unwrap_or_default();
        if self.molecular_weight > 0.0 {
            if !description.is_empty() {
                description.push_str(" - ");
            }
            description.push_str(&format!("{:.2} g/mol", self.molecular_weight));
        }

        Chemical {
            id: format!("pubchem-{}", self.cid),
            name: self.name,
            formula: self.molecular_formula,
            cas_number,
            category,
            hazard_level: HazardLevel::Moderate,
            description,
            image_url: Some(image_url(self.cid, 300)),
        }
    }
}

/// Carbon appears as `C` not followed by a lowercase letter (so not Cl, Ca, Cu...).
fn formula_has_carbon(formula: &str) -> bool {
    let mut chars = formula.chars().peekable();
    while let Some(c) = chars.next() {
        if c == 'C' && !chars.peek().is_some_and(char::is_ascii_lowercase) {
            return true;
        }
    }
    false
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GhsClassification {
    pub pictograms: Vec<String>,
    pub signal_word: String,
    pub hazard_statements: Vec<String>,
    pub precautionary_statements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SafetyData {
    pub ghs_classification: Option<GhsClassification>,
    pub hazards: Option<Vec<String>>,
    pub first_aid: Option<Vec<String>>,
    pub fire_fighting: Option<Vec<String>>,
    pub handling: Option<Vec<String>>,
    pub storage: Option<Vec<String>>,
    pub disposal: Option<Vec<String>>,
}

impl SafetyData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompoundProperties {
    #[serde(rename = "CID")]
    pub cid: u64,
    #[serde(default)]
    pub molecular_formula: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub molecular_weight: Option<f64>,
    #[serde(rename = "IUPACName", default)]
    pub iupac_name: Option<String>,
    #[serde(rename = "CanonicalSMILES", default)]
    pub canonical_smiles: Option<String>,
    #[serde(rename = "InChI", default)]
    pub inchi: Option<String>,
    #[serde(rename = "InChIKey", default)]
    pub inchi_key: Option<String>,
}

// PUG REST compound records

#[derive(Deserialize)]
struct CompoundsResponse {
    #[serde(rename = "PC_Compounds", default)]
    compounds: Vec<PcCompound>,
}

#[derive(Deserialize)]
struct PcCompound {
    id: PcCompoundId,
    #[serde(default)]
    props: Vec<PcProp>,
}

#[derive(Deserialize)]
struct PcCompoundId {
    id: PcCid,
}

#[derive(Deserialize)]
struct PcCid {
    cid: u64,
}

#[derive(Deserialize)]
struct PcProp {
    urn: PcUrn,
    #[serde(default)]
    value: PcValue,
}

#[derive(Deserialize)]
struct PcUrn {
    #[serde(default)]
    label: String,
}

#[derive(Deserialize, Default)]
struct PcValue {
    sval: Option<String>,
    fval: Option<f64>,
}

impl PcCompound {
    fn prop(&self, label: &str) -> Option<&PcValue> {
        self.props
            .iter()
            .find(|p| p.urn.label == label)
            .map(|p| &p.value)
    }

    fn into_compound(self, name: &str) -> PubChemCompound {
        let text = |label: &str| self.prop(label).and_then(|v| v.sval.clone());
        let molecular_weight = self
            .prop("Molecular Weight")
            .and_then(|v| v.fval.or_else(|| v.sval.as_deref()?.parse().ok()))
            .unwrap_or(0.0);

        PubChemCompound {
            cid: self.id.id.cid,
            name: name.to_string(),
            molecular_formula: text("Molecular Formula").unwrap_or_default(),
            molecular_weight,
            iupac_name: text("IUPAC Name"),
            canonical_smiles: text("SMILES"),
        }
    }
}

#[derive(Deserialize)]
struct PropertiesResponse {
    #[serde(rename = "PropertyTable")]
    table: Option<PropertyTable>,
}

#[derive(Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<CompoundProperties>,
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.parse().ok(),
        None => None,
    })
}

// PUG View record tree

#[derive(Deserialize)]
struct ViewResponse {
    #[serde(rename = "Record")]
    record: Option<ViewRecord>,
}

#[derive(Deserialize)]
struct ViewRecord {
    #[serde(rename = "Section", default)]
    sections: Vec<ViewSection>,
}

#[derive(Deserialize)]
struct ViewSection {
    #[serde(rename = "TOCHeading", default)]
    heading: String,
    #[serde(rename = "Section", default)]
    sections: Vec<ViewSection>,
    #[serde(rename = "Information", default)]
    information: Vec<ViewInformation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ViewInformation {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<ViewValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ViewValue {
    #[serde(default)]
    string_with_markup: Option<Vec<StringWithMarkup>>,
    #[serde(default)]
    string: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StringWithMarkup {
    #[serde(default)]
    string: String,
    #[serde(default)]
    markup: Vec<Markup>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Markup {
    #[serde(default)]
    extra: Option<String>,
}

/// Depth-first search for a section by its table-of-contents heading.
fn find_section<'a>(sections: &'a [ViewSection], heading: &str) -> Option<&'a ViewSection> {
    for section in sections {
        if section.heading == heading {
            return Some(section);
        }
        if let Some(found) = find_section(&section.sections, heading) {
            return Some(found);
        }
    }
    None
}

/// All text in a section and its subsections, in document order.
fn extract_text(section: &ViewSection) -> Vec<String> {
    let mut texts = Vec::new();

    for info in &section.information {
        let Some(value) = &info.value else {
            continue;
        };
        if let Some(markup) = &value.string_with_markup {
            texts.extend(
                markup
                    .iter()
                    .filter(|m| !m.string.is_empty())
                    .map(|m| m.string.clone()),
            );
        } else if let Some(s) = &value.string {
            texts.push(s.clone());
        }
    }

    for subsection in &section.sections {
        texts.extend(extract_text(subsection));
    }

    texts
}

fn parse_ghs(section: &ViewSection) -> GhsClassification {
    let mut ghs = GhsClassification::default();

    for info in &section.information {
        let markup = info
            .value
            .as_ref()
            .and_then(|v| v.string_with_markup.as_deref())
            .unwrap_or_default();

        match info.name.as_deref() {
            Some("Pictogram(s)") => {
                ghs.pictograms = markup
                    .first()
                    .map(|m| m.markup.iter().filter_map(|x| x.extra.clone()).collect())
                    .unwrap_or_default();
            }
            Some("Signal") => {
                ghs.signal_word = markup.first().map(|m| m.string.clone()).unwrap_or_default();
            }
            Some("GHS Hazard Statements") => {
                ghs.hazard_statements = markup.iter().map(|m| m.string.clone()).collect();
            }
            Some("Precautionary Statement Codes") => {
                ghs.precautionary_statements = markup.iter().map(|m| m.string.clone()).collect();
            }
            _ => {}
        }
    }

    ghs
}

fn parse_safety_sections(sections: &[ViewSection]) -> SafetyData {
    let text_of = |heading: &str| find_section(sections, heading).map(extract_text);

    let mut data = SafetyData {
        ghs_classification: find_section(sections, "GHS Classification").map(parse_ghs),
        hazards: text_of("Hazards Identification"),
        first_aid: text_of("First Aid Measures"),
        fire_fighting: text_of("Fire Fighting Measures"),
        disposal: text_of("Disposal Methods"),
        ..Default::default()
    };

    if let Some(texts) = text_of("Handling and Storage") {
        let mentions = |word: &str| -> Vec<String> {
            texts
                .iter()
                .filter(|t| t.to_lowercase().contains(word))
                .cloned()
                .collect()
        };
        data.handling = Some(mentions("handling"));
        data.storage = Some(mentions("storage"));
    }

    data
}

/// URL of the 2D structure image for a compound.
#[must_use]
pub fn image_url(cid: u64, size: u32) -> String {
    format!("https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/cid/{cid}/PNG?image_size={size}x{size}")
}

#[derive(Clone)]
pub struct PubChemClient {
    client: Client,
    base_url: String,
    view_url: String,
}

impl PubChemClient {
    pub fn new(config: &PubChemConfig) -> Result<Self, ClientError> {
        let client =
            super::build_http_client(Duration::from_secs(config.request_timeout_seconds))?;
        Ok(Self::with_client(client, &config.base_url, &config.view_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str, view_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            view_url: view_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_compounds(&self, name: &str) -> Result<Option<Vec<PcCompound>>, ClientError> {
        let url = format!(
            "{}/compound/name/{}/JSON",
            self.base_url,
            urlencoding::encode(name)
        );
        debug!("Querying PubChem compounds for '{}'", name);

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: CompoundsResponse = ensure_success(SERVICE, response).await?.json().await?;
        Ok(Some(body.compounds))
    }

    /// Compounds whose name matches; an unknown name is an empty list.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<PubChemCompound>, ClientError> {
        let compounds = self.fetch_compounds(name).await?.unwrap_or_default();
        Ok(compounds.into_iter().map(|c| c.into_compound(name)).collect())
    }

    /// First compound registered under `cas_number`, if any.
    pub async fn search_by_cas(
        &self,
        cas_number: &str,
    ) -> Result<Option<PubChemCompound>, ClientError> {
        let compounds = self.fetch_compounds(cas_number).await?.unwrap_or_default();
        Ok(compounds
            .into_iter()
            .next()
            .map(|c| c.into_compound(cas_number)))
    }

    pub async fn safety_data(&self, cid: u64) -> Result<SafetyData, ClientError> {
        let url = format!(
            "{}/data/compound/{cid}/JSON/?heading={SAFETY_HEADINGS}",
            self.view_url
        );
        debug!("Fetching PubChem safety data for CID {}", cid);

        let response = ensure_success(SERVICE, self.client.get(&url).send().await?).await?;
        let body: ViewResponse = response.json().await?;

        let sections = body.record.map(|r| r.sections).unwrap_or_default();
        Ok(parse_safety_sections(&sections))
    }

    pub async fn properties(&self, cid: u64) -> Result<Option<CompoundProperties>, ClientError> {
        let url = format!(
            "{}/compound/cid/{cid}/property/MolecularFormula,MolecularWeight,IUPACName,CanonicalSMILES,InChI,InChIKey/JSON",
            self.base_url
        );

        let response = ensure_success(SERVICE, self.client.get(&url).send().await?).await?;
        let body: PropertiesResponse = response.json().await?;

        Ok(body.table.and_then(|t| t.properties.into_iter().next()))
    }
}

#[async_trait]
impl ChemicalSource for PubChemClient {
    /// The name endpoint also resolves CAS numbers, so one lookup covers both.
    async fn search(&self, query: &str) -> Result<Vec<Chemical>, ClientError> {
        let compounds = self.search_by_name(query).await?;

        Ok(compounds
            .into_iter()
            .map(PubChemCompound::into_chemical)
            .collect())
    }
}
