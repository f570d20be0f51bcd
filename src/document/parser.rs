use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{de_opt_string, non_empty, ExtraFields};

/// The op-codes understood by the parser interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserType {
    Plain,
    LineStrict,
    JsonObject,
    JsonArray,
    Jsonl,
    TaggedLine,
    Regex,
    Python,
    Any,
}

impl ParserType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "plain" => Some(ParserType::Plain),
            "line_strict" => Some(ParserType::LineStrict),
            "json_object" => Some(ParserType::JsonObject),
            "json_array" => Some(ParserType::JsonArray),
            "jsonl" => Some(ParserType::Jsonl),
            "tagged_line" => Some(ParserType::TaggedLine),
            "regex" => Some(ParserType::Regex),
            "python" => Some(ParserType::Python),
            "any" => Some(ParserType::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParserType::Plain => "plain",
            ParserType::LineStrict => "line_strict",
            ParserType::JsonObject => "json_object",
            ParserType::JsonArray => "json_array",
            ParserType::Jsonl => "jsonl",
            ParserType::TaggedLine => "tagged_line",
            ParserType::Regex => "regex",
            ParserType::Python => "python",
            ParserType::Any => "any",
        }
    }
}

/// A parser rule: an op-code plus its option bag. Children of an `any` cascade are bare specs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserSpec {
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_string"
    )]
    pub parser_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, JsonValue>,
}

impl ParserSpec {
    pub fn new(parser_type: &str) -> Self {
        ParserSpec {
            parser_type: Some(parser_type.to_string()),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        non_empty(&self.parser_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_string"
    )]
    pub parser_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, JsonValue>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ParserProfile {
    /// The rule this profile describes, detached from its identity fields.
    pub fn spec(&self) -> ParserSpec {
        ParserSpec {
            parser_type: self.parser_type.clone(),
            options: self.options.clone(),
        }
    }
}
