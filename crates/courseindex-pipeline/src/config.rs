//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use courseindex_core::felt;

use crate::error::IndexError;

/// Configuration for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unique name for this pipeline (used as the cursor key).
    pub id: String,
    /// Contract whose events are indexed. Events from any other address
    /// are dropped by the router.
    pub contract_address: String,
    /// First block of interest. Blocks below this are skipped outright.
    pub starting_block: u64,
    /// Store connection string (`sqlite://...` or `postgresql://...`).
    pub database_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id: "courseindex".into(),
            contract_address:
                "0x5390dc11f780b241418e875095cca768ded2a9c1b605af036bf2760bd5bf6ef".into(),
            starting_block: 755_193,
            database_url: "sqlite://courseindex.db".into(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &str) -> Result<Self, IndexError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| IndexError::Config(format!("read {path}: {e}")))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| IndexError::Config(format!("parse {path}: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.id.is_empty() {
            return Err(IndexError::Config("pipeline id must not be empty".into()));
        }
        if self.database_url.is_empty() {
            return Err(IndexError::Config("database_url must not be empty".into()));
        }
        felt::canonical(&self.contract_address).map_err(|_| {
            IndexError::Config(format!(
                "contract_address is not a valid hex word: {}",
                self.contract_address
            ))
        })?;
        Ok(())
    }

    /// The configured contract address in canonical hex.
    pub fn canonical_contract(&self) -> Result<String, IndexError> {
        felt::canonical(&self.contract_address)
            .map_err(|e| IndexError::Config(format!("contract_address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.starting_block, 755_193);
    }

    #[test]
    fn rejects_empty_id() {
        let config = PipelineConfig {
            id: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IndexError::Config(_))));
    }

    #[test]
    fn rejects_malformed_contract_address() {
        let config = PipelineConfig {
            contract_address: "not-hex".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(IndexError::Config(_))));
    }

    #[test]
    fn contract_address_canonicalizes() {
        let config = PipelineConfig {
            contract_address: "0x05390DC11F780B241418E875095CCA768DED2A9C1B605AF036BF2760BD5BF6EF"
                .into(),
            ..Default::default()
        };
        assert_eq!(
            config.canonical_contract().unwrap(),
            "0x5390dc11f780b241418e875095cca768ded2a9c1b605af036bf2760bd5bf6ef"
        );
    }
}
