//! Compilation of a [`ParserSpec`] option bag into a typed [`ParserRule`].
//!
//! Compiling validates everything that can be checked without sample text (required options,
//! regex syntax, cascade shape). The validator uses the same entry point, so a parser document
//! that saves cleanly is one the preview can run.

use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use super::{
    failure::ParseFailure,
    pattern::{self, bool_option, RegexFlags},
};
use crate::document::{ParserSpec, ParserType};

/// Default `tagged_line` pattern: `@@<id>@@<text>`.
pub const DEFAULT_TAG_PATTERN: &str = r"^@@(?P<id>\d+)@@(?P<text>.*)$";

/// What `line_strict` does with more than one line of output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiLinePolicy {
    /// Drop blank lines and join the rest with a single space
    Join,
    /// Keep the first line only
    First,
    /// Fail with `multiple_lines_detected`
    #[default]
    Error,
}

/// Ordering applied to `tagged_line` matches before output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagOrder {
    #[default]
    Input,
    /// Sort on the numeric `id` group
    Id,
    /// Sort on the numeric `line` group (falling back to `id`)
    LineNumber,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSelector {
    /// Dotted path through objects and lists
    Path(String),
    /// A single object key, taken literally (dots included)
    Key(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureGroup {
    Index(usize),
    Name(String),
}

/// Where a `python` rule's code lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Inline(String),
    File(String),
}

/// A compiled parser rule, ready to run against sample text.
#[derive(Debug, Clone)]
pub enum ParserRule {
    Plain,
    LineStrict {
        multi_line: MultiLinePolicy,
    },
    JsonObject {
        selector: JsonSelector,
    },
    JsonArray,
    Jsonl {
        path: Option<String>,
    },
    TaggedLine {
        pattern: Regex,
        order: TagOrder,
    },
    Regex {
        pattern: Regex,
        group: CaptureGroup,
    },
    Python {
        source: ScriptSource,
        function: String,
    },
    /// Cascade: each branch is tried in order. Branches that failed to compile stay in place
    /// and fail when their turn comes.
    Any(Vec<Result<ParserRule, ParseFailure>>),
}

fn string_option<'a>(options: &'a Map<String, JsonValue>, key: &str) -> Option<&'a str> {
    options
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl ParserRule {
    /// Compile a top-level spec (an `any` cascade is allowed here).
    pub fn compile(spec: &ParserSpec) -> Result<ParserRule, ParseFailure> {
        Self::compile_inner(spec, true)
    }

    fn compile_inner(spec: &ParserSpec, allow_cascade: bool) -> Result<ParserRule, ParseFailure> {
        let type_name = spec
            .type_name()
            .ok_or_else(|| ParseFailure::InvalidParserEntry("missing parser type".to_string()))?;
        let parser_type = ParserType::parse(type_name)
            .ok_or_else(|| ParseFailure::UnsupportedParser(type_name.to_string()))?;
        let options = &spec.options;

        match parser_type {
            ParserType::Plain => Ok(ParserRule::Plain),
            ParserType::LineStrict => {
                let multi_line = match string_option(options, "multi_line") {
                    None => MultiLinePolicy::default(),
                    Some("join") => MultiLinePolicy::Join,
                    Some("first") => MultiLinePolicy::First,
                    Some("error") => MultiLinePolicy::Error,
                    Some(other) => {
                        return Err(ParseFailure::InvalidParserEntry(format!(
                            "unknown multi_line policy '{other}'"
                        )))
                    }
                };
                Ok(ParserRule::LineStrict { multi_line })
            }
            ParserType::JsonObject => {
                let selector = if let Some(path) = string_option(options, "path") {
                    JsonSelector::Path(path.to_string())
                } else if let Some(key) = string_option(options, "key") {
                    JsonSelector::Key(key.to_string())
                } else {
                    return Err(ParseFailure::MissingPath);
                };
                Ok(ParserRule::JsonObject { selector })
            }
            ParserType::JsonArray => Ok(ParserRule::JsonArray),
            ParserType::Jsonl => Ok(ParserRule::Jsonl {
                path: string_option(options, "path").map(str::to_string),
            }),
            ParserType::TaggedLine => {
                let source = string_option(options, "pattern").unwrap_or(DEFAULT_TAG_PATTERN);
                let pattern = pattern::compile(source, RegexFlags::from_options(options)?)?;
                let order = if bool_option(options, "sort_by_id") {
                    TagOrder::Id
                } else if bool_option(options, "sort_by_line_number") {
                    TagOrder::LineNumber
                } else {
                    TagOrder::Input
                };
                Ok(ParserRule::TaggedLine { pattern, order })
            }
            ParserType::Regex => {
                let source = string_option(options, "pattern").ok_or(ParseFailure::MissingPattern)?;
                let pattern = pattern::compile(source, RegexFlags::from_options(options)?)?;
                let group = capture_group(options.get("group"))?;
                match &group {
                    CaptureGroup::Index(index) if *index >= pattern.captures_len() => {
                        return Err(ParseFailure::InvalidParserEntry(format!(
                            "pattern has no group {index}"
                        )))
                    }
                    CaptureGroup::Name(name)
                        if !pattern.capture_names().any(|n| n == Some(name.as_str())) =>
                    {
                        return Err(ParseFailure::InvalidParserEntry(format!(
                            "pattern has no group named '{name}'"
                        )))
                    }
                    _ => {}
                }
                Ok(ParserRule::Regex { pattern, group })
            }
            ParserType::Python => {
                let source = if let Some(script) = string_option(options, "script") {
                    ScriptSource::Inline(script.to_string())
                } else if let Some(path) = string_option(options, "path") {
                    ScriptSource::File(path.to_string())
                } else {
                    return Err(ParseFailure::InvalidParserEntry(
                        "python parser needs 'script' or 'path'".to_string(),
                    ));
                };
                let function = string_option(options, "function")
                    .or_else(|| string_option(options, "entry"))
                    .ok_or_else(|| {
                        ParseFailure::InvalidParserEntry(
                            "python parser needs 'function' or 'entry'".to_string(),
                        )
                    })?;
                Ok(ParserRule::Python {
                    source,
                    function: function.to_string(),
                })
            }
            ParserType::Any => {
                if !allow_cascade {
                    return Err(ParseFailure::InvalidParserEntry(
                        "'any' parsers cannot be nested".to_string(),
                    ));
                }
                let entries = match options.get("parsers") {
                    None | Some(JsonValue::Null) => return Err(ParseFailure::MissingAnyParsers),
                    Some(JsonValue::Array(entries)) if entries.is_empty() => {
                        return Err(ParseFailure::MissingAnyParsers)
                    }
                    Some(JsonValue::Array(entries)) => entries,
                    Some(_) => {
                        return Err(ParseFailure::InvalidParserEntry(
                            "'parsers' must be a list".to_string(),
                        ))
                    }
                };
                Ok(ParserRule::Any(
                    entries.iter().map(Self::compile_branch).collect(),
                ))
            }
        }
    }

    fn compile_branch(entry: &JsonValue) -> Result<ParserRule, ParseFailure> {
        if !entry.is_object() {
            return Err(ParseFailure::InvalidParserEntry(
                "cascade entries must be mappings".to_string(),
            ));
        }
        let spec: ParserSpec = serde_json::from_value(entry.clone())
            .map_err(|e| ParseFailure::InvalidParserEntry(e.to_string()))?;
        Self::compile_inner(&spec, false)
    }
}

fn capture_group(value: Option<&JsonValue>) -> Result<CaptureGroup, ParseFailure> {
    match value {
        None | Some(JsonValue::Null) => Ok(CaptureGroup::Index(0)),
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .map(|i| CaptureGroup::Index(i as usize))
            .ok_or_else(|| ParseFailure::InvalidParserEntry(format!("invalid group {n}"))),
        Some(JsonValue::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(CaptureGroup::Index(0))
            } else if let Ok(index) = s.parse::<usize>() {
                Ok(CaptureGroup::Index(index))
            } else {
                Ok(CaptureGroup::Name(s.to_string()))
            }
        }
        Some(other) => Err(ParseFailure::InvalidParserEntry(format!(
            "invalid group {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_requires_options() {
        let missing_path = ParserSpec::new("json_object");
        assert_eq!(
            ParserRule::compile(&missing_path).unwrap_err(),
            ParseFailure::MissingPath
        );
        assert_eq!(
            ParserRule::compile(&ParserSpec::new("regex")).unwrap_err(),
            ParseFailure::MissingPattern
        );
        assert_eq!(
            ParserRule::compile(&ParserSpec::new("any")).unwrap_err(),
            ParseFailure::MissingAnyParsers
        );
        assert_eq!(
            ParserRule::compile(&ParserSpec::new("any").with_option("parsers", json!([])))
                .unwrap_err(),
            ParseFailure::MissingAnyParsers
        );
        assert_eq!(
            ParserRule::compile(&ParserSpec::new("xml"))
                .unwrap_err()
                .code(),
            "unsupported_parser"
        );
    }

    #[test]
    fn test_nested_any_branch_is_invalid() {
        let spec = ParserSpec::new("any").with_option(
            "parsers",
            json!([{"type": "any", "options": {"parsers": [{"type": "plain"}]}}, "plain"]),
        );
        match ParserRule::compile(&spec).unwrap() {
            ParserRule::Any(branches) => {
                assert_eq!(branches.len(), 2);
                for branch in branches {
                    assert_eq!(branch.unwrap_err().code(), "invalid_parser_entry");
                }
            }
            other => panic!("expected cascade, got {other:?}"),
        }
    }

    #[test]
    fn test_regex_group_checked_at_compile() {
        let spec = ParserSpec::new("regex")
            .with_option("pattern", "(?P<content>.*)")
            .with_option("group", "missing");
        assert_eq!(
            ParserRule::compile(&spec).unwrap_err().code(),
            "invalid_parser_entry"
        );
        let spec = ParserSpec::new("regex")
            .with_option("pattern", "(a)(b)")
            .with_option("group", 2);
        assert!(ParserRule::compile(&spec).is_ok());
        let spec = ParserSpec::new("regex")
            .with_option("pattern", "(a)(b)")
            .with_option("group", 3);
        assert!(ParserRule::compile(&spec).is_err());
    }

    #[test]
    fn test_python_requires_script_and_function() {
        let spec = ParserSpec::new("python").with_option("script", "def f(x): return x");
        assert_eq!(
            ParserRule::compile(&spec).unwrap_err().code(),
            "invalid_parser_entry"
        );
        let spec = spec.with_option("entry", "f");
        assert!(matches!(
            ParserRule::compile(&spec).unwrap(),
            ParserRule::Python { .. }
        ));
    }

    #[test]
    fn test_line_strict_policy_names() {
        let spec = ParserSpec::new("line_strict").with_option("multi_line", "first");
        assert!(matches!(
            ParserRule::compile(&spec).unwrap(),
            ParserRule::LineStrict {
                multi_line: MultiLinePolicy::First
            }
        ));
        let spec = ParserSpec::new("line_strict").with_option("multi_line", "merge");
        assert!(ParserRule::compile(&spec).is_err());
    }
}
