use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::GlossaError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Trailing debounce applied to form edits before they are serialized
    pub debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { debounce_ms: 300 }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Report unknown api/parser `type` values as errors instead of warnings
    pub unknown_type_is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            root: PathBuf::from("profiles"),
            extension: "yaml".to_string(),
        }
    }
}

/// Crate configuration, read from a TOML file with `[sync]`, `[validation]` and `[store]`
/// tables. Every table and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub sync: SyncConfig,
    pub validation: ValidationConfig,
    pub store: StoreConfig,
}

impl CoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, GlossaError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GlossaError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(CoreConfig::default());
        }
        let content = read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GlossaError> {
        tracing::debug!("Attempting to write config to: {:?}", path.as_ref());
        write(path, toml::to_string(self)?)?;
        Ok(())
    }
}
