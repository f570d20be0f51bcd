//! Failure kinds a parser rule can report, each with a fixed symbolic code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a parser rule could not extract output from a sample.
///
/// Each variant maps to one stable symbolic [`code`](ParseFailure::code); the detail carried by
/// some variants is for logs and tooltips only and never part of the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ParseFailure {
    #[error("'any' parser has no child parsers")]
    MissingAnyParsers,
    #[error("invalid parser entry: {0}")]
    InvalidParserEntry(String),
    #[error("multiple lines detected where a single line was expected")]
    MultipleLinesDetected,
    #[error("expected a JSON array")]
    JsonArrayExpected,
    #[error("expected a JSON object")]
    JsonObjectExpected,
    #[error("no 'path' or 'key' option given")]
    MissingPath,
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("invalid list index: {0}")]
    ListIndexInvalid(String),
    #[error("no line matched the tag pattern")]
    NoTaggedLines,
    #[error("no 'pattern' option given")]
    MissingPattern,
    #[error("pattern did not match")]
    PatternNotMatched,
    #[error("pattern failed to compile: {0}")]
    InvalidPattern(String),
    #[error("line {0} is not valid JSON")]
    InvalidJsonLine(usize),
    #[error("unsupported parser: {0}")]
    UnsupportedParser(String),
    #[error("script runner failed: {0}")]
    ScriptRunnerFailed(String),
}

impl ParseFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ParseFailure::MissingAnyParsers => "missing_any_parsers",
            ParseFailure::InvalidParserEntry(_) => "invalid_parser_entry",
            ParseFailure::MultipleLinesDetected => "multiple_lines_detected",
            ParseFailure::JsonArrayExpected => "json_array_expected",
            ParseFailure::JsonObjectExpected => "json_object_expected",
            ParseFailure::MissingPath => "missing_path",
            ParseFailure::KeyNotFound(_) => "key_not_found",
            ParseFailure::ListIndexInvalid(_) => "list_index_invalid",
            ParseFailure::NoTaggedLines => "no_tagged_lines",
            ParseFailure::MissingPattern => "missing_pattern",
            ParseFailure::PatternNotMatched => "pattern_not_matched",
            ParseFailure::InvalidPattern(_) => "invalid_pattern",
            ParseFailure::InvalidJsonLine(_) => "invalid_json_line",
            ParseFailure::UnsupportedParser(_) => "unsupported_parser",
            ParseFailure::ScriptRunnerFailed(_) => "script_runner_failed",
        }
    }
}
