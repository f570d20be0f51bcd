//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; later calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub const API_GPT: &str = r#"id: gpt
name: GPT
type: openai_compat
base_url: https://api.example.com/v1
model: gpt-4o
timeout: 60
"#;

#[allow(dead_code)]
pub const API_CLAUDE: &str = r#"id: claude
name: Claude
type: openai_compat
base_url: https://claude.example.com/v1
model: sonnet
"#;

#[allow(dead_code)]
pub const PROMPT_DEFAULT: &str = r#"id: default
name: Default
system_template: You are a translator.
user_template: |
  Translate the following text:
  {{source}}
"#;

#[allow(dead_code)]
pub const PARSER_TAGGED: &str = r#"id: tagged
name: Tagged lines
type: tagged_line
options:
  sort_by_id: true
"#;

#[allow(dead_code)]
pub const CHUNK_LINES: &str = r#"id: lines
name: Lines
chunk_type: line
options:
  strict: true
"#;

#[allow(dead_code)]
pub const POLICY_STRICT: &str = r#"id: strict
name: Strict
type: strict
options:
  on_mismatch: retry
"#;

/// A pipeline wired to the fixture profiles.
#[allow(dead_code)]
pub fn pipeline(id: &str, provider: &str) -> String {
    format!(
        "id: {id}\nname: {id}\nprovider: {provider}\nprompt: default\nparser: tagged\n\
         chunk_policy: lines\nline_policy: strict\nsettings:\n  temperature: 0.2\n"
    )
}

/// Write `text` as `<root>/<kind>/<id>.yaml`.
#[allow(dead_code)]
pub fn write_profile(root: &Path, kind: &str, id: &str, text: &str) {
    let dir = root.join(kind);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{id}.yaml")), text).unwrap();
}

/// Create a profile directory holding one profile of every kind plus a pipeline `main` that
/// references them.
///
/// Returns the path to the profile root (e.g. `<temp_dir>/profiles/`).
#[allow(dead_code)]
pub fn create_profile_tree(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("profiles");
    std::fs::create_dir(&root).unwrap();

    write_profile(&root, "api", "gpt", API_GPT);
    write_profile(&root, "prompt", "default", PROMPT_DEFAULT);
    write_profile(&root, "parser", "tagged", PARSER_TAGGED);
    write_profile(&root, "chunk", "lines", CHUNK_LINES);
    write_profile(&root, "policy", "strict", POLICY_STRICT);
    write_profile(&root, "pipeline", "main", &pipeline("main", "gpt"));

    root
}
