//! Configuration loading from YAML/JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::DEFAULT_KEY_PREFIX;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Where state is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per key
    pub data_dir: PathBuf,

    /// Prefix for all storage keys
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".gorev"),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// The admin account inserted into an empty user list.
///
/// The identity number only needs to be eleven digits; it is not checked
/// against the checksum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeedConfig {
    pub id: String,
    pub identity_number: String,
    pub name: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            id: "1".to_string(),
            identity_number: "12345678910".to_string(),
            name: "Admin User".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

impl Config {
    /// Parse a config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format by extension (`.json` is JSON,
    /// anything else is YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.storage.key_prefix;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::ValidationError(format!(
                "storage.key_prefix must be non-empty and use only [A-Za-z0-9_-]: {prefix:?}"
            )));
        }

        if self.seed.id.is_empty() {
            return Err(ConfigError::ValidationError(
                "seed.id must not be empty".to_string(),
            ));
        }

        let identity = &self.seed.identity_number;
        if identity.len() != 11 || !identity.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::ValidationError(format!(
                "seed.identity_number must be 11 digits: {identity:?}"
            )));
        }

        Ok(())
    }
}
