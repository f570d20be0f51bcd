use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use serde_yaml::Error as YamlError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum GlossaError {
    #[error("Profile already exists: {0}")]
    Conflict(String),
    #[error("Invalid profile document: {0}")]
    InvalidDocument(String),
    #[error("Invalid profile id '{0}'")]
    InvalidId(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Profile failed validation: {}", .0.join(", "))]
    Validation(Vec<String>),
}

impl GlossaError {
    /// Symbolic codes carried by a validation failure, empty for every other variant.
    pub fn validation_codes(&self) -> &[String] {
        match self {
            GlossaError::Validation(codes) => codes,
            _ => &[],
        }
    }
}

impl From<toml::de::Error> for GlossaError {
    fn from(src: toml::de::Error) -> GlossaError {
        GlossaError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for GlossaError {
    fn from(src: toml::ser::Error) -> GlossaError {
        GlossaError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for GlossaError {
    fn from(src: JsonError) -> GlossaError {
        GlossaError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<YamlError> for GlossaError {
    fn from(src: YamlError) -> GlossaError {
        GlossaError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<io::Error> for GlossaError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => GlossaError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => GlossaError::PermissionDenied,
            _ => GlossaError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: GlossaError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, GlossaError::NotFound(_)));
    }

    #[test]
    fn test_validation_codes_accessor() {
        let err = GlossaError::Validation(vec!["missing_id".to_string()]);
        assert_eq!(err.validation_codes(), &["missing_id".to_string()]);
        assert_eq!(format!("{err}"), "Profile failed validation: missing_id");
        assert!(GlossaError::PermissionDenied.validation_codes().is_empty());
    }
}
