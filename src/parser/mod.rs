//! # Parser Interpreter
//!
//! Executes an output-parser rule against a sample of raw model output and yields the extracted
//! translation as `{text, lines}`, or a [`ParseFailure`] carrying one fixed symbolic code.
//!
//! The interpreter is a pure function of `(spec, text)`: every call compiles the rule afresh and
//! drops it on return, so a live preview may call [`run`] on every keystroke.
//!
//! ## Cascades
//!
//! A rule of type `any` holds an ordered list of child rules under `options.parsers`. Each child
//! is tried against the same input; the first success wins. When every child fails the *last*
//! failure is returned as-is, so the reported code always belongs to one concrete branch.
//!
//! ## Scripts
//!
//! `python` rules are only checked for shape here. Running them is delegated to a
//! [`ScriptRunner`]; without one they fail with `unsupported_parser`.

pub mod failure;
pub mod json;
pub mod pattern;
pub mod rule;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use failure::ParseFailure;
pub use rule::{
    CaptureGroup, JsonSelector, MultiLinePolicy, ParserRule, ScriptSource, TagOrder,
    DEFAULT_TAG_PATTERN,
};

use crate::document::ParserSpec;

/// Successful parser output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParseOutput {
    pub text: String,
    pub lines: Vec<String>,
}

impl ParseOutput {
    /// Single logical unit; `lines` is `text` split on `\n` (never empty).
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text.split('\n').map(str::to_string).collect();
        ParseOutput { text, lines }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        ParseOutput {
            text: lines.join("\n"),
            lines,
        }
    }
}

/// External executor for `python` rules.
pub trait ScriptRunner {
    fn run(
        &self,
        source: &ScriptSource,
        function: &str,
        text: &str,
    ) -> Result<ParseOutput, String>;
}

/// Run a parser spec against `text`.
pub fn run(spec: &ParserSpec, text: &str) -> Result<ParseOutput, ParseFailure> {
    run_with(spec, text, None)
}

/// Run a parser spec, delegating `python` rules to `runner`.
pub fn run_with(
    spec: &ParserSpec,
    text: &str,
    runner: Option<&dyn ScriptRunner>,
) -> Result<ParseOutput, ParseFailure> {
    ParserRule::compile(spec)?.apply(text, runner)
}

fn trim_trailing_newlines(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

impl ParserRule {
    pub fn apply(
        &self,
        text: &str,
        runner: Option<&dyn ScriptRunner>,
    ) -> Result<ParseOutput, ParseFailure> {
        match self {
            ParserRule::Plain => Ok(ParseOutput::from_text(trim_trailing_newlines(text))),
            ParserRule::LineStrict { multi_line } => {
                let lines = split_lines(trim_trailing_newlines(text));
                if lines.len() <= 1 {
                    return Ok(ParseOutput::from_text(lines.concat()));
                }
                match multi_line {
                    // blank means whitespace-only; survivors are joined as written
                    MultiLinePolicy::Join => Ok(ParseOutput::from_text(
                        lines
                            .iter()
                            .filter(|line| !line.trim().is_empty())
                            .copied()
                            .collect::<Vec<_>>()
                            .join(" "),
                    )),
                    MultiLinePolicy::First => Ok(ParseOutput::from_text(lines[0])),
                    MultiLinePolicy::Error => Err(ParseFailure::MultipleLinesDetected),
                }
            }
            ParserRule::JsonObject { selector } => {
                let root: JsonValue = serde_json::from_str(text.trim())
                    .map_err(|_| ParseFailure::JsonObjectExpected)?;
                if !root.is_object() {
                    return Err(ParseFailure::JsonObjectExpected);
                }
                let value = match selector {
                    JsonSelector::Path(path) => json::resolve_path(&root, path)?,
                    JsonSelector::Key(key) => root
                        .get(key)
                        .ok_or_else(|| ParseFailure::KeyNotFound(key.clone()))?,
                };
                Ok(ParseOutput::from_text(json::stringify(value)))
            }
            ParserRule::JsonArray => {
                let root: JsonValue = serde_json::from_str(text.trim())
                    .map_err(|_| ParseFailure::JsonArrayExpected)?;
                match root {
                    JsonValue::Array(items) => Ok(ParseOutput::from_lines(
                        items.iter().map(json::stringify).collect(),
                    )),
                    _ => Err(ParseFailure::JsonArrayExpected),
                }
            }
            ParserRule::Jsonl { path } => {
                let mut lines = Vec::new();
                for (index, line) in split_lines(trim_trailing_newlines(text)).iter().enumerate() {
                    if line.trim().is_empty() {
                        lines.push(String::new());
                        continue;
                    }
                    let value: JsonValue = serde_json::from_str(line)
                        .map_err(|_| ParseFailure::InvalidJsonLine(index + 1))?;
                    let value = match path {
                        Some(path) => json::resolve_path(&value, path)?,
                        None => &value,
                    };
                    lines.push(json::stringify(value));
                }
                Ok(ParseOutput::from_lines(lines))
            }
            ParserRule::TaggedLine { pattern, order } => {
                let mut entries: Vec<(Option<u64>, String)> = Vec::new();
                for line in split_lines(text) {
                    let Some(caps) = pattern.captures(line) else {
                        continue;
                    };
                    let extracted = caps
                        .name("text")
                        .or_else(|| caps.get(1))
                        .or_else(|| caps.get(0))
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    let numeric = |name: &str| {
                        caps.name(name)
                            .and_then(|m| m.as_str().trim().parse::<u64>().ok())
                    };
                    let key = match order {
                        TagOrder::Input => None,
                        TagOrder::Id => numeric("id"),
                        TagOrder::LineNumber => numeric("line").or_else(|| numeric("id")),
                    };
                    entries.push((key, extracted));
                }
                if entries.is_empty() {
                    return Err(ParseFailure::NoTaggedLines);
                }
                if *order != TagOrder::Input {
                    // keyless entries keep their relative order after the keyed ones
                    entries.sort_by_key(|(key, _)| (key.is_none(), *key));
                }
                Ok(ParseOutput::from_lines(
                    entries.into_iter().map(|(_, text)| text).collect(),
                ))
            }
            ParserRule::Regex { pattern, group } => {
                let caps = pattern
                    .captures(text)
                    .ok_or(ParseFailure::PatternNotMatched)?;
                let matched = match group {
                    CaptureGroup::Index(index) => caps.get(*index),
                    CaptureGroup::Name(name) => caps.name(name),
                };
                Ok(ParseOutput::from_text(
                    matched.map(|m| m.as_str()).unwrap_or_default(),
                ))
            }
            ParserRule::Python { source, function } => match runner {
                Some(runner) => runner
                    .run(source, function, text)
                    .map_err(ParseFailure::ScriptRunnerFailed),
                None => Err(ParseFailure::UnsupportedParser("python".to_string())),
            },
            ParserRule::Any(branches) => {
                let mut last_failure = ParseFailure::MissingAnyParsers;
                for (index, branch) in branches.iter().enumerate() {
                    let attempt = match branch {
                        Ok(rule) => rule.apply(text, runner),
                        Err(failure) => Err(failure.clone()),
                    };
                    match attempt {
                        Ok(output) => return Ok(output),
                        Err(failure) => {
                            tracing::debug!(
                                "cascade branch {index} failed: {} ({failure})",
                                failure.code()
                            );
                            last_failure = failure;
                        }
                    }
                }
                Err(last_failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_log::test;

    fn cascade(children: JsonValue) -> ParserSpec {
        ParserSpec::new("any").with_option("parsers", children)
    }

    #[test]
    fn test_plain_strips_trailing_newlines() {
        let spec = ParserSpec::new("plain");
        assert_eq!(
            run(&spec, "a\nb\n\n").unwrap(),
            ParseOutput {
                text: "a\nb".to_string(),
                lines: vec!["a".to_string(), "b".to_string()]
            }
        );
        let empty = run(&spec, "").unwrap();
        assert_eq!(empty.text, "");
        assert_eq!(empty.lines, vec![String::new()]);
    }

    #[test]
    fn test_line_strict_policies() {
        let single = ParserSpec::new("line_strict");
        assert_eq!(run(&single, "only\n").unwrap().text, "only");
        assert_eq!(
            run(&single, "one\ntwo").unwrap_err(),
            ParseFailure::MultipleLinesDetected
        );

        let join = single.clone().with_option("multi_line", "join");
        assert_eq!(run(&join, "one\n\n  two \n").unwrap().text, "one   two ");
        assert_eq!(run(&join, "a\n \t \nb").unwrap().lines, vec!["a b"]);

        let first = single.with_option("multi_line", "first");
        assert_eq!(run(&first, "one\ntwo").unwrap().lines, vec!["one"]);
    }

    #[test]
    fn test_json_object_path() {
        let spec = ParserSpec::new("json_object").with_option("path", "translation");
        assert_eq!(
            run(&spec, r#"{"translation": "hello"}"#).unwrap(),
            ParseOutput {
                text: "hello".to_string(),
                lines: vec!["hello".to_string()]
            }
        );
        assert_eq!(
            run(&spec, r#"["hello"]"#).unwrap_err(),
            ParseFailure::JsonObjectExpected
        );
        assert_eq!(
            run(&spec, "not json").unwrap_err(),
            ParseFailure::JsonObjectExpected
        );
        assert_eq!(
            run(&spec, r#"{"other": 1}"#).unwrap_err().code(),
            "key_not_found"
        );

        let nested = ParserSpec::new("json_object").with_option("path", "result.lines.x");
        assert_eq!(
            run(&nested, r#"{"result": {"lines": ["a"]}}"#)
                .unwrap_err()
                .code(),
            "list_index_invalid"
        );

        let dotted_key = ParserSpec::new("json_object").with_option("key", "a.b");
        assert_eq!(run(&dotted_key, r#"{"a.b": "x"}"#).unwrap().text, "x");
    }

    #[test]
    fn test_json_array_stringifies_elements() {
        let spec = ParserSpec::new("json_array");
        let out = run(&spec, r#"["a", 2, {"k": "v"}]"#).unwrap();
        assert_eq!(out.lines, vec!["a", "2", r#"{"k":"v"}"#]);
        assert_eq!(
            run(&spec, r#"{"a": 1}"#).unwrap_err(),
            ParseFailure::JsonArrayExpected
        );
    }

    #[test]
    fn test_jsonl_preserves_blank_lines() {
        let spec = ParserSpec::new("jsonl").with_option("path", "t");
        let out = run(&spec, "{\"t\": \"a\"}\n\n{\"t\": \"b\"}\n").unwrap();
        assert_eq!(out.lines, vec!["a", "", "b"]);
        assert_eq!(
            run(&spec, "{\"t\": \"a\"}\nnope").unwrap_err(),
            ParseFailure::InvalidJsonLine(2)
        );
    }

    #[test]
    fn test_tagged_line_sort_by_id() {
        let spec = ParserSpec::new("tagged_line").with_option("sort_by_id", true);
        let forward = run(&spec, "@@1@@hello\n@@2@@world").unwrap();
        assert_eq!(forward.lines, vec!["hello", "world"]);
        let reversed = run(&spec, "@@2@@world\n@@1@@hello").unwrap();
        assert_eq!(reversed.lines, vec!["hello", "world"]);
        assert_eq!(reversed.text, "hello\nworld");
    }

    #[test]
    fn test_tagged_line_drops_unmatched() {
        let spec = ParserSpec::new("tagged_line");
        let out = run(&spec, "preamble\n@@2@@b\nnoise\n@@1@@a").unwrap();
        assert_eq!(out.lines, vec!["b", "a"]);
        assert_eq!(
            run(&spec, "nothing tagged").unwrap_err(),
            ParseFailure::NoTaggedLines
        );
    }

    #[test]
    fn test_regex_named_group_dotall() {
        let spec = ParserSpec::new("regex")
            .with_option("pattern", r"(?s)TRANSLATION:\s*(?P<content>.*)$")
            .with_option("group", "content")
            .with_option("flags", json!(["dotall"]));
        let out = run(&spec, "noise\nTRANSLATION: final answer").unwrap();
        assert_eq!(out.text, "final answer");

        assert_eq!(
            run(&spec, "no marker here").unwrap_err(),
            ParseFailure::PatternNotMatched
        );
    }

    #[test]
    fn test_regex_capture_is_returned_verbatim() {
        let spec = ParserSpec::new("regex")
            .with_option("pattern", "<out>(.*)</out>")
            .with_option("group", 1)
            .with_option("dotall", true);
        let out = run(&spec, "<out> a\n</out>").unwrap();
        assert_eq!(out.text, " a\n");
        assert_eq!(out.lines, vec![" a", ""]);
    }

    #[test]
    fn test_python_without_runner() {
        let spec = ParserSpec::new("python")
            .with_option("script", "def parse(text): return text")
            .with_option("function", "parse");
        assert_eq!(
            run(&spec, "x").unwrap_err(),
            ParseFailure::UnsupportedParser("python".to_string())
        );
    }

    struct Upper;

    impl ScriptRunner for Upper {
        fn run(
            &self,
            _source: &ScriptSource,
            function: &str,
            text: &str,
        ) -> Result<ParseOutput, String> {
            if function == "upper" {
                Ok(ParseOutput::from_text(text.to_uppercase()))
            } else {
                Err(format!("no function {function}"))
            }
        }
    }

    #[test]
    fn test_python_with_runner() {
        let spec = ParserSpec::new("python")
            .with_option("path", "parsers/upper.py")
            .with_option("entry", "upper");
        assert_eq!(run_with(&spec, "abc", Some(&Upper)).unwrap().text, "ABC");
        let spec = spec.with_option("entry", "lower");
        assert_eq!(
            run_with(&spec, "abc", Some(&Upper)).unwrap_err().code(),
            "script_runner_failed"
        );
    }

    #[test]
    fn test_cascade_returns_first_success() {
        let spec = cascade(json!([
            {"type": "json_object", "options": {"path": "translation"}},
            {"type": "line_strict"},
            {"type": "plain"}
        ]));
        let out = run(&spec, "line one\nline two").unwrap();
        assert_eq!(out.text, "line one\nline two");

        let out = run(&spec, r#"{"translation": "hi"}"#).unwrap();
        assert_eq!(out.text, "hi");
    }

    #[test]
    fn test_cascade_reports_last_failure() {
        let spec = cascade(json!([
            {"type": "line_strict"},
            {"type": "json_array"},
            {"type": "regex", "options": {"pattern": "^ZZZ"}}
        ]));
        assert_eq!(
            run(&spec, "a\nb").unwrap_err(),
            ParseFailure::PatternNotMatched
        );
    }

    #[test]
    fn test_cascade_skips_broken_branches() {
        let spec = cascade(json!([
            {"type": "regex"},
            {"type": "any", "options": {"parsers": [{"type": "plain"}]}},
            {"type": "plain"}
        ]));
        assert_eq!(run(&spec, "ok\n").unwrap().text, "ok");

        let spec = cascade(json!([{"type": "plain"}, {"type": "regex"}]));
        assert_eq!(run(&spec, "ok").unwrap().text, "ok");
        let spec = cascade(json!([{"type": "json_array"}, {"type": "regex"}]));
        assert_eq!(run(&spec, "ok").unwrap_err(), ParseFailure::MissingPattern);
    }

    #[test]
    fn test_repeated_runs_are_independent() {
        let spec = ParserSpec::new("tagged_line").with_option("sort_by_id", true);
        for _ in 0..100 {
            assert_eq!(run(&spec, "@@2@@b\n@@1@@a").unwrap().lines, vec!["a", "b"]);
        }
    }
}
