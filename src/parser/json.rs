//! JSON helpers shared by the `json_object`, `json_array` and `jsonl` rules.

use serde_json::Value as JsonValue;

use super::failure::ParseFailure;

/// Walk a dotted path (`result.items.0.text`) through objects and arrays.
///
/// Segments applied to a list must be integers; a missing object key, or a segment applied to
/// a scalar, is reported as [`ParseFailure::KeyNotFound`].
pub fn resolve_path<'a>(root: &'a JsonValue, path: &str) -> Result<&'a JsonValue, ParseFailure> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            JsonValue::Object(map) => map
                .get(segment)
                .ok_or_else(|| ParseFailure::KeyNotFound(segment.to_string()))?,
            JsonValue::Array(items) => {
                let index = segment
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ParseFailure::ListIndexInvalid(segment.to_string()))?;
                items
                    .get(index)
                    .ok_or_else(|| ParseFailure::ListIndexInvalid(segment.to_string()))?
            }
            _ => return Err(ParseFailure::KeyNotFound(segment.to_string())),
        };
    }
    Ok(current)
}

/// Text form of an extracted value: strings verbatim, null as empty, everything else as
/// compact JSON.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
