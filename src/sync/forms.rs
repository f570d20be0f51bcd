//! Form structs for every profile kind.
//!
//! Forms hold what an editor shows: text fields as `String` (empty meaning unset), numbers as
//! the text the user typed, toggles as `Option<bool>`. Writing a form back turns numeric text
//! into a number when it parses and keeps it as a string otherwise, so the validator can still
//! report it. Numbers and JSON objects are stored normalized (`05` becomes `5`, object keys are
//! re-spelled), so reading a field back goes through the [`FieldCache`] to recover the text that
//! produced the stored value.

use serde_json::{Number, Value as JsonValue};

use super::{FieldCache, FormModel, Mapping};
use crate::properties::ProfileKind;

fn text_of(map: &Mapping, key: &str) -> String {
    match map.get(key) {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        Some(JsonValue::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn bool_of(map: &Mapping, key: &str) -> Option<bool> {
    map.get(key).and_then(JsonValue::as_bool)
}

fn list_of(map: &Mapping, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Cache key of `key` inside the nested mapping `scope` (empty for top-level keys).
fn field_path(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        key.to_string()
    } else {
        format!("{scope}.{key}")
    }
}

fn json_text_of(map: &Mapping, key: &str, fields: &FieldCache) -> String {
    if let Some(text) = fields.recall(key, map.get(key)) {
        return text.to_string();
    }
    match map.get(key) {
        None | Some(JsonValue::Null) => String::new(),
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

fn number_of(map: &Mapping, scope: &str, key: &str, fields: &FieldCache) -> String {
    match fields.recall(&field_path(scope, key), map.get(key)) {
        Some(text) => text.to_string(),
        None => text_of(map, key),
    }
}

fn put_text(map: &mut Mapping, key: &str, value: &str) {
    if value.is_empty() {
        map.remove(key);
    } else {
        map.insert(key.to_string(), JsonValue::String(value.to_string()));
    }
}

fn put_number(map: &mut Mapping, scope: &str, key: &str, text: &str, fields: &mut FieldCache) {
    let path = field_path(scope, key);
    let value = text.trim();
    if value.is_empty() {
        map.remove(key);
        fields.remember(&path, text, None);
        return;
    }
    let number = if let Ok(n) = value.parse::<u64>() {
        Some(Number::from(n))
    } else if let Ok(n) = value.parse::<i64>() {
        Some(Number::from(n))
    } else {
        value.parse::<f64>().ok().and_then(Number::from_f64)
    };
    let json = match number {
        Some(n) => JsonValue::Number(n),
        None => JsonValue::String(value.to_string()),
    };
    fields.remember(&path, text, Some(&json));
    map.insert(key.to_string(), json);
}

fn put_bool(map: &mut Mapping, key: &str, value: Option<bool>) {
    match value {
        Some(b) => {
            map.insert(key.to_string(), JsonValue::Bool(b));
        }
        None => {
            map.remove(key);
        }
    }
}

fn put_list(map: &mut Mapping, key: &str, values: &[String]) {
    let values: Vec<JsonValue> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| JsonValue::String(v.to_string()))
        .collect();
    if values.is_empty() {
        map.remove(key);
    } else {
        map.insert(key.to_string(), JsonValue::Array(values));
    }
}

fn nested(map: &Mapping, key: &str) -> Mapping {
    match map.get(key) {
        Some(JsonValue::Object(inner)) => inner.clone(),
        _ => Mapping::new(),
    }
}

/// Apply `write` to the sub-mapping under `key`, keeping its unmodeled keys. An empty result
/// removes the key.
fn put_nested(map: &mut Mapping, key: &str, write: impl FnOnce(&mut Mapping)) {
    let mut inner = nested(map, key);
    write(&mut inner);
    if inner.is_empty() {
        map.remove(key);
    } else {
        map.insert(key.to_string(), JsonValue::Object(inner));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiForm {
    pub id: String,
    pub name: String,
    pub api_type: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// JSON object text
    pub headers: String,
    /// JSON object text
    pub params: String,
    pub timeout: String,
    pub concurrency: String,
    pub rpm: String,
    pub max_retries: String,
    pub members: Vec<String>,
}

impl FormModel for ApiForm {
    const KIND: ProfileKind = ProfileKind::Api;
    const JSON_FIELDS: &'static [&'static str] = &["headers", "params"];

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        ApiForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            api_type: text_of(map, "type"),
            base_url: text_of(map, "base_url"),
            model: text_of(map, "model"),
            api_key: text_of(map, "api_key"),
            headers: json_text_of(map, "headers", fields),
            params: json_text_of(map, "params", fields),
            timeout: number_of(map, "", "timeout", fields),
            concurrency: number_of(map, "", "concurrency", fields),
            rpm: number_of(map, "", "rpm", fields),
            max_retries: number_of(map, "", "max_retries", fields),
            members: list_of(map, "members"),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        put_text(map, "type", &self.api_type);
        put_text(map, "base_url", &self.base_url);
        put_text(map, "model", &self.model);
        put_text(map, "api_key", &self.api_key);
        fields.put_json(map, "headers", &self.headers);
        fields.put_json(map, "params", &self.params);
        put_number(map, "", "timeout", &self.timeout, fields);
        put_number(map, "", "concurrency", &self.concurrency, fields);
        put_number(map, "", "rpm", &self.rpm, fields);
        put_number(map, "", "max_retries", &self.max_retries, fields);
        put_list(map, "members", &self.members);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineForm {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub prompt: String,
    pub parser: String,
    pub chunk_policy: String,
    pub line_policy: String,
    pub apply_line_policy: Option<bool>,
    pub batch_size: String,
    pub concurrency: String,
}

impl FormModel for PipelineForm {
    const KIND: ProfileKind = ProfileKind::Pipeline;

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        let settings = nested(map, "settings");
        PipelineForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            provider: text_of(map, "provider"),
            prompt: text_of(map, "prompt"),
            parser: text_of(map, "parser"),
            chunk_policy: text_of(map, "chunk_policy"),
            line_policy: text_of(map, "line_policy"),
            apply_line_policy: bool_of(map, "apply_line_policy"),
            batch_size: number_of(&settings, "settings", "batch_size", fields),
            concurrency: number_of(&settings, "settings", "concurrency", fields),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        put_text(map, "provider", &self.provider);
        put_text(map, "prompt", &self.prompt);
        put_text(map, "parser", &self.parser);
        put_text(map, "chunk_policy", &self.chunk_policy);
        put_text(map, "line_policy", &self.line_policy);
        put_bool(map, "apply_line_policy", self.apply_line_policy);
        put_nested(map, "settings", |settings| {
            put_number(settings, "settings", "batch_size", &self.batch_size, fields);
            put_number(settings, "settings", "concurrency", &self.concurrency, fields);
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptForm {
    pub id: String,
    pub name: String,
    pub system_template: String,
    pub user_template: String,
    pub before_lines: String,
    pub after_lines: String,
    pub joiner: String,
    pub source_format: String,
    pub source_lines: String,
}

impl FormModel for PromptForm {
    const KIND: ProfileKind = ProfileKind::Prompt;

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        let context = nested(map, "context");
        PromptForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            system_template: text_of(map, "system_template"),
            user_template: text_of(map, "user_template"),
            before_lines: number_of(&context, "context", "before_lines", fields),
            after_lines: number_of(&context, "context", "after_lines", fields),
            joiner: text_of(&context, "joiner"),
            source_format: text_of(&context, "source_format"),
            source_lines: number_of(&context, "context", "source_lines", fields),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        put_text(map, "system_template", &self.system_template);
        put_text(map, "user_template", &self.user_template);
        put_nested(map, "context", |context| {
            put_number(context, "context", "before_lines", &self.before_lines, fields);
            put_number(context, "context", "after_lines", &self.after_lines, fields);
            put_text(context, "joiner", &self.joiner);
            put_text(context, "source_format", &self.source_format);
            put_number(context, "context", "source_lines", &self.source_lines, fields);
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserForm {
    pub id: String,
    pub name: String,
    pub parser_type: String,
    /// JSON object text
    pub options: String,
}

impl FormModel for ParserForm {
    const KIND: ProfileKind = ProfileKind::Parser;
    const JSON_FIELDS: &'static [&'static str] = &["options"];

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        ParserForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            parser_type: text_of(map, "type"),
            options: json_text_of(map, "options", fields),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        put_text(map, "type", &self.parser_type);
        fields.put_json(map, "options", &self.options);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyForm {
    pub id: String,
    pub name: String,
    pub policy_type: String,
    pub on_mismatch: String,
    pub trim: Option<bool>,
    pub similarity_threshold: String,
    pub checks: Vec<String>,
}

impl FormModel for PolicyForm {
    const KIND: ProfileKind = ProfileKind::Policy;

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        let options = nested(map, "options");
        PolicyForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            policy_type: text_of(map, "type"),
            on_mismatch: text_of(&options, "on_mismatch"),
            trim: bool_of(&options, "trim"),
            similarity_threshold: number_of(&options, "options", "similarity_threshold", fields),
            checks: list_of(&options, "checks"),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        put_text(map, "type", &self.policy_type);
        put_nested(map, "options", |options| {
            put_text(options, "on_mismatch", &self.on_mismatch);
            put_bool(options, "trim", self.trim);
            put_number(options, "options", "similarity_threshold", &self.similarity_threshold, fields);
            put_list(options, "checks", &self.checks);
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkForm {
    pub id: String,
    pub name: String,
    pub chunk_type: String,
    pub target_chars: String,
    pub max_chars: String,
    pub balance_threshold: String,
    pub balance_count: String,
    pub kana_retry_enabled: Option<bool>,
    pub kana_retry_threshold: String,
    pub kana_retry_min_chars: String,
}

impl FormModel for ChunkForm {
    const KIND: ProfileKind = ProfileKind::Chunk;

    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self {
        let options = nested(map, "options");
        let chunk_type = match text_of(map, "chunk_type") {
            t if t.is_empty() => text_of(map, "type"),
            t => t,
        };
        ChunkForm {
            id: text_of(map, "id"),
            name: text_of(map, "name"),
            chunk_type,
            target_chars: number_of(&options, "options", "target_chars", fields),
            max_chars: number_of(&options, "options", "max_chars", fields),
            balance_threshold: number_of(&options, "options", "balance_threshold", fields),
            balance_count: number_of(&options, "options", "balance_count", fields),
            kana_retry_enabled: bool_of(&options, "kana_retry_enabled"),
            kana_retry_threshold: number_of(&options, "options", "kana_retry_threshold", fields),
            kana_retry_min_chars: number_of(&options, "options", "kana_retry_min_chars", fields),
        }
    }

    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache) {
        put_text(map, "id", &self.id);
        put_text(map, "name", &self.name);
        // `type` is an older spelling of `chunk_type`; keeping both would be a duplicate key
        map.remove("type");
        put_text(map, "chunk_type", &self.chunk_type);
        put_nested(map, "options", |options| {
            put_number(options, "options", "target_chars", &self.target_chars, fields);
            put_number(options, "options", "max_chars", &self.max_chars, fields);
            put_number(options, "options", "balance_threshold", &self.balance_threshold, fields);
            put_number(options, "options", "balance_count", &self.balance_count, fields);
            put_bool(options, "kana_retry_enabled", self.kana_retry_enabled);
            put_number(options, "options", "kana_retry_threshold", &self.kana_retry_threshold, fields);
            put_number(options, "options", "kana_retry_min_chars", &self.kana_retry_min_chars, fields);
        });
    }
}
