//! Reference chemicals bundled into the binary.
//!
//! Searching the catalog never touches the network, so its matches can be
//! shown immediately while a remote lookup is still pending.

use anyhow::{Context, Result};
use rust_embed::RustEmbed;

use crate::models::{Category, Chemical};

#[derive(RustEmbed)]
#[folder = "data"]
struct BundledData;

const CATALOG_FILE: &str = "chemicals.json";

#[derive(Debug, Clone, Default)]
pub struct ChemicalCatalog {
    chemicals: Vec<Chemical>,
}

impl ChemicalCatalog {
    pub fn bundled() -> Result<Self> {
        let file = BundledData::get(CATALOG_FILE)
            .with_context(|| format!("Bundled {CATALOG_FILE} is missing"))?;
        let chemicals: Vec<Chemical> = serde_json::from_slice(&file.data)
            .with_context(|| format!("Failed to parse bundled {CATALOG_FILE}"))?;
        Ok(Self { chemicals })
    }

    #[must_use]
    pub const fn from_chemicals(chemicals: Vec<Chemical>) -> Self {
        Self { chemicals }
    }

    #[must_use]
    pub fn all(&self) -> &[Chemical] {
        &self.chemicals
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Chemical> {
        self.chemicals.iter().find(|c| c.id == id)
    }

    /// Case-insensitive substring match on name, formula and CAS number.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Chemical> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.chemicals
            .iter()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<Chemical> {
        self.chemicals
            .iter()
            .filter(|c| c.category == category)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HazardLevel;

    #[test]
    fn bundled_catalog_loads_with_unique_ids() {
        let catalog = ChemicalCatalog::bundled().unwrap();
        assert!(!catalog.all().is_empty());

        let mut ids: Vec<_> = catalog.all().iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.all().len());
    }

    #[test]
    fn acetone_is_found_by_partial_name_formula_and_cas() {
        let catalog = ChemicalCatalog::bundled().unwrap();

        let by_name = catalog.search("aceto");
        assert!(by_name.iter().any(|c| c.id == "1" && c.name == "Acetone"));

        assert!(catalog.search("C3H6O").iter().any(|c| c.id == "1"));
        assert!(catalog.search("67-64-1").iter().any(|c| c.id == "1"));
    }

    #[test]
    fn blank_query_matches_nothing() {
        let catalog = ChemicalCatalog::bundled().unwrap();
        assert!(catalog.search("").is_empty());
        assert!(catalog.search("   ").is_empty());
        assert!(catalog.search("unobtainium").is_empty());
    }

    #[test]
    fn filters_by_category() {
        let catalog = ChemicalCatalog::bundled().unwrap();
        let acids = catalog.by_category(Category::Acid);
        assert!(!acids.is_empty());
        assert!(acids.iter().all(|c| c.category == Category::Acid));
        assert!(catalog.get("2").is_some_and(|c| c.hazard_level == HazardLevel::Extreme));
    }
}
