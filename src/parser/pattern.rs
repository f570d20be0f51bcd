//! Pattern preprocessing for user supplied regular expressions.
//!
//! Parser profiles are written with Python-flavoured named groups (`(?P<name>...)`). All
//! rewriting into the `regex` crate's native syntax happens in [`translate_named_groups`], so
//! the rest of the interpreter never looks at pattern text.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value as JsonValue};

use super::failure::ParseFailure;

/// Rewrite `(?P<name>` into `(?<name>`, leaving escaped parentheses and character classes alone.
pub fn translate_named_groups(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                // a leading ']' (or '^]') is a literal member of the class
                if chars.peek() == Some(&'^') {
                    out.push('^');
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '(' if !in_class => {
                out.push(c);
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('?')
                    && lookahead.next() == Some('P')
                    && lookahead.next() == Some('<')
                {
                    out.push_str("?<");
                    chars.next();
                    chars.next();
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Inline flags assembled from a parser's `flags` option and its boolean shorthands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub multiline: bool,
    pub dotall: bool,
    pub ignorecase: bool,
}

impl RegexFlags {
    fn set(&mut self, flag: &str) -> Result<(), ParseFailure> {
        match flag.trim().to_lowercase().as_str() {
            "m" | "multiline" | "re.m" | "re.multiline" => self.multiline = true,
            "s" | "dotall" | "re.s" | "re.dotall" => self.dotall = true,
            "i" | "ignorecase" | "re.i" | "re.ignorecase" => self.ignorecase = true,
            "" => {}
            other => {
                return Err(ParseFailure::InvalidParserEntry(format!(
                    "unknown regex flag '{other}'"
                )))
            }
        }
        Ok(())
    }

    /// Read `flags` (a list of names, or a string of single letters) plus the `multiline`,
    /// `dotall` and `ignorecase` booleans.
    pub fn from_options(options: &Map<String, JsonValue>) -> Result<Self, ParseFailure> {
        let mut flags = RegexFlags::default();
        match options.get("flags") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::String(letters)) => {
                if letters.chars().all(|c| c.is_ascii_alphabetic()) && letters.len() <= 3 {
                    for letter in letters.chars() {
                        flags.set(&letter.to_string())?;
                    }
                } else {
                    for name in letters.split([',', '|', ' ']) {
                        flags.set(name)?;
                    }
                }
            }
            Some(JsonValue::Array(names)) => {
                for name in names {
                    match name.as_str() {
                        Some(name) => flags.set(name)?,
                        None => {
                            return Err(ParseFailure::InvalidParserEntry(
                                "regex flags must be strings".to_string(),
                            ))
                        }
                    }
                }
            }
            Some(_) => {
                return Err(ParseFailure::InvalidParserEntry(
                    "regex flags must be a list or a string".to_string(),
                ))
            }
        }
        flags.multiline |= bool_option(options, "multiline");
        flags.dotall |= bool_option(options, "dotall");
        flags.ignorecase |= bool_option(options, "ignorecase");
        Ok(flags)
    }
}

pub(crate) fn bool_option(options: &Map<String, JsonValue>, key: &str) -> bool {
    options.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
}

/// Compile a user pattern after named-group translation.
pub fn compile(pattern: &str, flags: RegexFlags) -> Result<Regex, ParseFailure> {
    RegexBuilder::new(&translate_named_groups(pattern))
        .multi_line(flags.multiline)
        .dot_matches_new_line(flags.dotall)
        .case_insensitive(flags.ignorecase)
        .build()
        .map_err(|e| ParseFailure::InvalidPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translate_named_groups() {
        assert_eq!(
            translate_named_groups(r"^@@(?P<id>\d+)@@(?P<text>.*)$"),
            r"^@@(?<id>\d+)@@(?<text>.*)$"
        );
        assert_eq!(translate_named_groups(r"\(?P<x>"), r"\(?P<x>");
        assert_eq!(translate_named_groups(r"[(?P<]"), r"[(?P<]");
        assert_eq!(translate_named_groups(r"[]](?P<a>b)"), r"[]](?<a>b)");
        assert_eq!(translate_named_groups(r"(?:x)(?i)y"), r"(?:x)(?i)y");
    }

    #[test]
    fn test_flags_from_options() {
        let options = json!({"flags": ["dotall", "I"]});
        let flags = RegexFlags::from_options(options.as_object().unwrap()).unwrap();
        assert!(flags.dotall && flags.ignorecase && !flags.multiline);

        let options = json!({"flags": "ms"});
        let flags = RegexFlags::from_options(options.as_object().unwrap()).unwrap();
        assert!(flags.dotall && flags.multiline);

        let options = json!({"multiline": true});
        let flags = RegexFlags::from_options(options.as_object().unwrap()).unwrap();
        assert!(flags.multiline && !flags.dotall);

        let options = json!({"flags": ["verbose"]});
        assert!(RegexFlags::from_options(options.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_compile_reports_invalid_pattern() {
        let err = compile("(unclosed", RegexFlags::default()).unwrap_err();
        assert_eq!(err.code(), "invalid_pattern");
        let re = compile("(?P<word>a+)", RegexFlags::default()).unwrap();
        assert_eq!(&re.captures("baaa").unwrap()["word"], "aaa");
    }
}
