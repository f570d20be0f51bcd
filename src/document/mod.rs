//! Typed profile documents.
//!
//! Every profile kind has its own body struct. Fields the crate understands are typed; keys it
//! does not understand land in a flattened `extra` bag and are written back untouched, so a
//! document authored by a newer (or older) release survives a load/save cycle.
//!
//! Scalars that users edit by hand (counts, thresholds) are wrapped in [`Lenient`] so that a
//! malformed value does not make the whole document unreadable. The validator reports those
//! values with a precise code instead.
//!
//! ## Formats
//!
//! Profiles are normally YAML, but JSON documents are accepted too. [`ProfileDocument::parse`]
//! tries the format suggested by the content first and falls back to the other one.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::{error::GlossaError, properties::ProfileKind};

pub mod api;
pub mod chunk;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod prompt;

pub use api::{ApiEndpoint, ApiProfile, ApiType};
pub use chunk::{ChunkOptions, ChunkProfile, ChunkType};
pub use parser::{ParserProfile, ParserSpec, ParserType};
pub use pipeline::{PipelineProfile, PipelineSettings};
pub use policy::{MismatchStrategy, PolicyOptions, PolicyProfile, PolicyType, QualityCheck};
pub use prompt::{PromptContext, PromptProfile, SourceFormat};

/// Unknown keys carried alongside the typed fields of a profile body.
pub type ExtraFields = BTreeMap<String, JsonValue>;

/// A scalar that either parsed as the expected type or is kept verbatim for the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(JsonValue),
}

impl<T: Copy> Lenient<T> {
    pub fn valid(&self) -> Option<T> {
        match self {
            Lenient::Valid(v) => Some(*v),
            Lenient::Invalid(_) => None,
        }
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(value: T) -> Self {
        Lenient::Valid(value)
    }
}

/// Accept strings, numbers and booleans for id-like fields (`id: 2024` is a common YAML slip).
pub(crate) fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(JsonValue::Number(n)) => Ok(Some(n.to_string())),
        Some(JsonValue::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, found {}",
            json_type_name(&other)
        ))),
    }
}

/// Trim a reference/id-like field, treating blank strings as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Metadata format of a profile document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from the first significant character.
    pub fn sniff(content: &str) -> Self {
        match content.trim_start().chars().next() {
            Some('{') => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

fn parse_json_value(content: &str) -> Result<JsonValue, GlossaError> {
    serde_json::from_str(content)
        .map_err(|e| GlossaError::InvalidDocument(format!("Failed to parse JSON: {e}")))
}

fn parse_yaml_value(content: &str) -> Result<JsonValue, GlossaError> {
    // YAML is read straight into serde_json::Value so the rest of the crate only deals with one
    // value model.
    serde_yaml::from_str(content)
        .map_err(|e| GlossaError::InvalidDocument(format!("Failed to parse YAML: {e}")))
}

/// Parse content with format preference and fallback to the other format.
pub fn parse_with_fallback(
    content: &str,
    primary: DocumentFormat,
) -> Result<(JsonValue, DocumentFormat), GlossaError> {
    match primary {
        DocumentFormat::Json => match parse_json_value(content) {
            Ok(value) => Ok((value, DocumentFormat::Json)),
            Err(json_err) => {
                tracing::debug!("JSON parsing failed, trying YAML fallback");
                match parse_yaml_value(content) {
                    Ok(value) => Ok((value, DocumentFormat::Yaml)),
                    Err(yaml_err) => Err(GlossaError::InvalidDocument(format!(
                        "Failed to parse as JSON or YAML.\nJSON: {json_err}\nYAML: {yaml_err}"
                    ))),
                }
            }
        },
        DocumentFormat::Yaml => match parse_yaml_value(content) {
            Ok(value) => Ok((value, DocumentFormat::Yaml)),
            Err(yaml_err) => {
                tracing::debug!("YAML parsing failed, trying JSON fallback");
                match parse_json_value(content) {
                    Ok(value) => Ok((value, DocumentFormat::Json)),
                    Err(json_err) => Err(GlossaError::InvalidDocument(format!(
                        "Failed to parse as YAML or JSON.\nYAML: {yaml_err}\nJSON: {json_err}"
                    ))),
                }
            }
        },
    }
}

/// Parse raw text into a JSON object, the shape every profile document must have.
pub fn parse_mapping(content: &str) -> Result<serde_json::Map<String, JsonValue>, GlossaError> {
    let (value, format) = parse_with_fallback(content, DocumentFormat::sniff(content))?;
    match value {
        JsonValue::Object(map) => Ok(map),
        // An empty YAML file parses to null; treat it as an empty document
        JsonValue::Null => Ok(serde_json::Map::new()),
        other => Err(GlossaError::InvalidDocument(format!(
            "{format:?} document root must be a mapping, found {}",
            json_type_name(&other)
        ))),
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "mapping",
    }
}

fn from_mapping<T: DeserializeOwned>(
    kind: ProfileKind,
    map: serde_json::Map<String, JsonValue>,
) -> Result<T, GlossaError> {
    serde_json::from_value(JsonValue::Object(map))
        .map_err(|e| GlossaError::InvalidDocument(format!("{kind} profile: {e}")))
}

/// The kind-specific content of a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileBody {
    Api(ApiProfile),
    Pipeline(PipelineProfile),
    Prompt(PromptProfile),
    Parser(ParserProfile),
    Policy(PolicyProfile),
    Chunk(ChunkProfile),
}

/// A loaded profile: its kind plus the typed body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDocument {
    pub kind: ProfileKind,
    pub body: ProfileBody,
}

impl ProfileDocument {
    /// Parse YAML or JSON text as a profile of `kind`.
    pub fn parse(kind: ProfileKind, content: &str) -> Result<Self, GlossaError> {
        Self::from_mapping(kind, parse_mapping(content)?)
    }

    pub fn from_mapping(
        kind: ProfileKind,
        map: serde_json::Map<String, JsonValue>,
    ) -> Result<Self, GlossaError> {
        let body = match kind {
            ProfileKind::Api => ProfileBody::Api(from_mapping(kind, map)?),
            ProfileKind::Pipeline => ProfileBody::Pipeline(from_mapping(kind, map)?),
            ProfileKind::Prompt => ProfileBody::Prompt(from_mapping(kind, map)?),
            ProfileKind::Parser => ProfileBody::Parser(from_mapping(kind, map)?),
            ProfileKind::Policy => ProfileBody::Policy(from_mapping(kind, map)?),
            ProfileKind::Chunk => ProfileBody::Chunk(from_mapping(kind, map)?),
        };
        Ok(ProfileDocument { kind, body })
    }

    pub fn new(body: ProfileBody) -> Self {
        let kind = match &body {
            ProfileBody::Api(_) => ProfileKind::Api,
            ProfileBody::Pipeline(_) => ProfileKind::Pipeline,
            ProfileBody::Prompt(_) => ProfileKind::Prompt,
            ProfileBody::Parser(_) => ProfileKind::Parser,
            ProfileBody::Policy(_) => ProfileKind::Policy,
            ProfileBody::Chunk(_) => ProfileKind::Chunk,
        };
        ProfileDocument { kind, body }
    }

    pub fn id(&self) -> Option<&str> {
        let id = match &self.body {
            ProfileBody::Api(p) => &p.id,
            ProfileBody::Pipeline(p) => &p.id,
            ProfileBody::Prompt(p) => &p.id,
            ProfileBody::Parser(p) => &p.id,
            ProfileBody::Policy(p) => &p.id,
            ProfileBody::Chunk(p) => &p.id,
        };
        id.as_deref()
    }

    pub fn set_id(&mut self, new_id: impl Into<String>) {
        let id = match &mut self.body {
            ProfileBody::Api(p) => &mut p.id,
            ProfileBody::Pipeline(p) => &mut p.id,
            ProfileBody::Prompt(p) => &mut p.id,
            ProfileBody::Parser(p) => &mut p.id,
            ProfileBody::Policy(p) => &mut p.id,
            ProfileBody::Chunk(p) => &mut p.id,
        };
        *id = Some(new_id.into());
    }

    pub fn name(&self) -> Option<&str> {
        let name = match &self.body {
            ProfileBody::Api(p) => &p.name,
            ProfileBody::Pipeline(p) => &p.name,
            ProfileBody::Prompt(p) => &p.name,
            ProfileBody::Parser(p) => &p.name,
            ProfileBody::Policy(p) => &p.name,
            ProfileBody::Chunk(p) => &p.name,
        };
        name.as_deref()
    }

    pub fn as_pipeline(&self) -> Option<&PipelineProfile> {
        match &self.body {
            ProfileBody::Pipeline(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pipeline_mut(&mut self) -> Option<&mut PipelineProfile> {
        match &mut self.body {
            ProfileBody::Pipeline(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&ChunkProfile> {
        match &self.body {
            ProfileBody::Chunk(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_parser(&self) -> Option<&ParserProfile> {
        match &self.body {
            ProfileBody::Parser(p) => Some(p),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Result<JsonValue, GlossaError> {
        let value = match &self.body {
            ProfileBody::Api(p) => serde_json::to_value(p)?,
            ProfileBody::Pipeline(p) => serde_json::to_value(p)?,
            ProfileBody::Prompt(p) => serde_json::to_value(p)?,
            ProfileBody::Parser(p) => serde_json::to_value(p)?,
            ProfileBody::Policy(p) => serde_json::to_value(p)?,
            ProfileBody::Chunk(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    /// Serialize the document back to YAML, extra fields included.
    pub fn to_yaml(&self) -> Result<String, GlossaError> {
        Ok(serde_yaml::to_string(&self.to_value()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_and_json_both_parse() {
        let yaml = "id: p1\nname: Plain\ntype: plain\n";
        let json = r#"{"id": "p1", "name": "Plain", "type": "plain"}"#;
        let a = ProfileDocument::parse(ProfileKind::Parser, yaml).unwrap();
        let b = ProfileDocument::parse(ProfileKind::Parser, json).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id(), Some("p1"));
        assert_eq!(a.name(), Some("Plain"));
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        let err = ProfileDocument::parse(ProfileKind::Api, "- a\n- b\n").unwrap_err();
        assert!(matches!(err, GlossaError::InvalidDocument(_)));
        let err = ProfileDocument::parse(ProfileKind::Api, "key: [unclosed").unwrap_err();
        assert!(matches!(err, GlossaError::InvalidDocument(_)));
    }

    #[test]
    fn test_empty_document_is_an_empty_mapping() {
        let doc = ProfileDocument::parse(ProfileKind::Prompt, "").unwrap();
        assert_eq!(doc.id(), None);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let yaml = "id: p1\ntype: plain\nlegacy_flag: true\nnested:\n  keep: [1, 2]\n";
        let doc = ProfileDocument::parse(ProfileKind::Parser, yaml).unwrap();
        let again = ProfileDocument::parse(ProfileKind::Parser, &doc.to_yaml().unwrap()).unwrap();
        assert_eq!(doc, again);
        let value = again.to_value().unwrap();
        assert_eq!(value["legacy_flag"], JsonValue::Bool(true));
        assert_eq!(value["nested"]["keep"][1], JsonValue::from(2));
    }

    #[test]
    fn test_set_id() {
        let mut doc = ProfileDocument::parse(ProfileKind::Chunk, "id: a\n").unwrap();
        doc.set_id("b");
        assert_eq!(doc.id(), Some("b"));
    }
}
