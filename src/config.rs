//! Harvest configuration files.
//!
//! A configuration is a JSON document with an optional `executor` section
//! and the persisted connector definitions:
//!
//! ```json
//! {
//!   "executor": { "max_concurrent_runs": 2, "delete_on_success": true },
//!   "definitions": [
//!     { "type": "SINK", "label": "Drop", "properties": { "sink-drop-folder": "/var/drop" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::model::EntityDefinition;

/// Overrides `executor.max_concurrent_runs`.
pub const ENV_MAX_CONCURRENT_RUNS: &str = "HARVEST_MAX_CONCURRENT_RUNS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings of the [`HarvestExecutor`](crate::executor::HarvestExecutor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Runs allowed to execute at the same time
    pub max_concurrent_runs: usize,

    /// Upper bound for a single publish call
    pub publish_timeout_secs: u64,

    /// Remove records from the source once delivered
    pub delete_on_success: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: 4,
            publish_timeout_secs: 300,
            delete_on_success: true,
        }
    }
}

impl ExecutorConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_runs == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_runs must be at least 1".to_string(),
            ));
        }
        if self.publish_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "publish_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestConfig {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub definitions: Vec<EntityDefinition>,
}

impl HarvestConfig {
    /// Reads a configuration file and applies environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: HarvestConfig = serde_json::from_str(&raw)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.executor.validate()?;
        Ok(config)
    }

    /// Parses a configuration without consulting the environment.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: HarvestConfig = serde_json::from_str(raw)?;
        config.executor.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_CONCURRENT_RUNS) {
            self.executor.max_concurrent_runs = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_MAX_CONCURRENT_RUNS, value
                ))
            })?;
        }
        Ok(())
    }

    /// First definition carrying `label`.
    pub fn definition(&self, label: &str) -> Option<&EntityDefinition> {
        self.definitions.iter().find(|d| d.label() == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "executor": { "max_concurrent_runs": 2 },
        "definitions": [
            { "type": "SINK", "label": "Drop", "properties": { "sink-drop-folder": "/var/drop" } },
            { "type": "GPT", "label": "Catalog", "properties": { "gpt-host-url": "http://localhost/geoportal/" } }
        ]
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let config = HarvestConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.executor.max_concurrent_runs, 2);
        assert_eq!(config.executor.publish_timeout_secs, 300);
        assert!(config.executor.delete_on_success);
        assert_eq!(config.definitions.len(), 2);
        assert_eq!(
            config.definition("Catalog").unwrap().connector_type(),
            "GPT"
        );
    }

    #[test]
    fn test_empty_document() {
        let config = HarvestConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HarvestConfig::default());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let err = HarvestConfig::from_json_str(r#"{"executor":{"max_concurrent_runs":0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_overrides() {
        let mut config = HarvestConfig::from_json_str(SAMPLE).unwrap();
        config
            .apply_overrides(|key| (key == ENV_MAX_CONCURRENT_RUNS).then(|| "8".to_string()))
            .unwrap();
        assert_eq!(config.executor.max_concurrent_runs, 8);

        let err = config
            .apply_overrides(|_| Some("many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_CONCURRENT_RUNS));
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("harvest.json");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(HarvestConfig::from_file(&path).unwrap().definitions.len(), 2);

        let err = HarvestConfig::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
