use serde::{Deserialize, Serialize};

use super::{de_opt_string, non_empty, ExtraFields, Lenient};

/// The placeholder every non-empty user template must contain.
pub const SOURCE_PLACEHOLDER: &str = "{{source}}";

/// How source lines are presented to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jsonl,
    Plain,
    Custom(String),
}

impl SourceFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "jsonl" => SourceFormat::Jsonl,
            "plain" => SourceFormat::Plain,
            other => SourceFormat::Custom(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_lines: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_lines: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joiner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_lines: Option<Lenient<u64>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PromptContext {
    pub fn source_format(&self) -> Option<SourceFormat> {
        non_empty(&self.source_format).map(SourceFormat::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PromptContext>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PromptProfile {
    /// A user template is usable when it is empty or carries the source placeholder.
    pub fn has_source_slot(&self) -> bool {
        match self.user_template.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(template) => template.contains(SOURCE_PLACEHOLDER),
        }
    }
}
