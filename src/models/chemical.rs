use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Category {
    Acid,
    Base,
    Solvent,
    Salt,
    Organic,
    Inorganic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Acid => "Acid",
            Self::Base => "Base",
            Self::Solvent => "Solvent",
            Self::Salt => "Salt",
            Self::Organic => "Organic",
            Self::Inorganic => "Inorganic",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HazardLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Extreme => "Extreme",
        };
        write!(f, "{s}")
    }
}

/// Reference record for a single substance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: String,
    pub name: String,
    pub formula: String,
    pub cas_number: String,
    pub category: Category,
    pub hazard_level: HazardLevel,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Chemical {
    /// Case-insensitive substring match on name, formula and CAS number.
    ///
    /// `needle` must already be lowercased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.formula.to_lowercase().contains(needle)
            || self.cas_number.to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acetone() -> Chemical {
        Chemical {
            id: "1".to_string(),
            name: "Acetone".to_string(),
            formula: "C3H6O".to_string(),
            cas_number: "67-64-1".to_string(),
            category: Category::Solvent,
            hazard_level: HazardLevel::Moderate,
            description: String::new(),
            image_url: None,
        }
    }

    #[test]
    fn matches_any_identifying_field() {
        let chem = acetone();
        assert!(chem.matches("aceto"));
        assert!(chem.matches("c3h6"));
        assert!(chem.matches("67-64"));
        assert!(!chem.matches("benz"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(acetone()).unwrap();
        assert_eq!(json["casNumber"], "67-64-1");
        assert_eq!(json["hazardLevel"], "Moderate");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn hazard_levels_are_ordered() {
        assert!(HazardLevel::Extreme > HazardLevel::High);
        assert!(HazardLevel::Low < HazardLevel::Moderate);
    }
}
