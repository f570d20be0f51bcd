//! Shared test utilities for profile fixtures

use crate::{
    properties::ProfileKind,
    store::{MemoryProfileStore, ProfileStore, SaveOptions},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub const API_GPT: &str = "id: gpt\nname: GPT\ntype: openai_compat\nbase_url: https://api.example.com/v1\nmodel: gpt-4o\n";
pub const API_BACKUP: &str =
    "id: backup\nname: Backup\ntype: openai_compat\nbase_url: https://backup.example.com\nmodel: small\n";
pub const PROMPT_DEFAULT: &str = "id: default\nname: Default\nuser_template: \"Translate:\\n{{source}}\"\n";
pub const PARSER_PLAIN: &str = "id: plain\nname: Plain\ntype: plain\n";
pub const CHUNK_LINES: &str = "id: lines\nname: Lines\nchunk_type: line\n";
pub const CHUNK_BLOCKS: &str =
    "id: blocks\nname: Blocks\nchunk_type: block\noptions:\n  target_chars: 800\n  max_chars: 1200\n";
pub const POLICY_STRICT: &str =
    "id: strict\nname: Strict\ntype: strict\noptions:\n  on_mismatch: retry\n";

/// A pipeline wired to the default fixtures, using line chunking with the strict policy.
pub fn line_pipeline(id: &str) -> String {
    format!(
        "id: {id}\nname: {id}\nprovider: gpt\nprompt: default\nparser: plain\nchunk_policy: lines\nline_policy: strict\n"
    )
}

/// A store holding one profile of every non-pipeline kind (two chunk profiles).
pub async fn seeded_store() -> MemoryProfileStore {
    init_logging();
    let store = MemoryProfileStore::new();
    let fixtures = [
        (ProfileKind::Api, "gpt", API_GPT),
        (ProfileKind::Prompt, "default", PROMPT_DEFAULT),
        (ProfileKind::Parser, "plain", PARSER_PLAIN),
        (ProfileKind::Chunk, "lines", CHUNK_LINES),
        (ProfileKind::Chunk, "blocks", CHUNK_BLOCKS),
        (ProfileKind::Policy, "strict", POLICY_STRICT),
    ];
    for (kind, id, text) in fixtures {
        store
            .save(kind, id, text, SaveOptions::default())
            .await
            .expect("fixture save");
    }
    store
}
