//! Manifest builder configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-organism submission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganismConfig {
    /// Default molecule type, e.g. `"genomic RNA"`.
    #[serde(default)]
    pub molecule_type: Option<String>,
}

/// Configuration for building assembly manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Name of the originating database, used in assembly descriptions.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Append a timestamp to assembly names so repeated test submissions
    /// don't collide on the registrar's alias uniqueness check.
    #[serde(default)]
    pub test_mode: bool,
}

fn default_db_name() -> String {
    "Loculus".to_string()
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            db_name: default_db_name(),
            test_mode: false,
        }
    }
}

/// Organism settings keyed by organism name.
pub type OrganismMap = BTreeMap<String, OrganismConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ManifestConfig::default();
        assert_eq!(config.db_name, "Loculus");
        assert!(!config.test_mode);
    }

    #[test]
    fn test_deserialize_organisms() {
        let toml = r#"
            [ebola-sudan]
            molecule_type = "genomic RNA"

            [mpox]
        "#;
        let organisms: OrganismMap = toml::from_str(toml).unwrap();
        assert_eq!(
            organisms["ebola-sudan"].molecule_type.as_deref(),
            Some("genomic RNA")
        );
        assert!(organisms["mpox"].molecule_type.is_none());
    }
}
