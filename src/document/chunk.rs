use serde::{Deserialize, Serialize};

use super::{de_opt_string, non_empty, ExtraFields, Lenient};

/// Granularity a chunk profile slices source text at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Line,
    Block,
}

impl ChunkType {
    /// `legacy` and `doc` are older spellings of `block`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "line" => Some(ChunkType::Line),
            "block" | "legacy" | "doc" => Some(ChunkType::Block),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_chars: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_threshold: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_count: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana_retry_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana_retry_threshold: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana_retry_min_chars: Option<Lenient<u64>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ChunkOptions {
    /// True if any of the block-only kana retry knobs is present.
    pub fn has_kana_retry(&self) -> bool {
        self.kana_retry_enabled.is_some()
            || self.kana_retry_threshold.is_some()
            || self.kana_retry_min_chars.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(
        default,
        alias = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_string"
    )]
    pub chunk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ChunkOptions>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ChunkProfile {
    pub fn chunk_type(&self) -> Option<ChunkType> {
        non_empty(&self.chunk_type).and_then(ChunkType::parse)
    }

    pub fn new(id: &str, chunk_type: ChunkType) -> Self {
        let type_name = match chunk_type {
            ChunkType::Line => "line",
            ChunkType::Block => "block",
        };
        ChunkProfile {
            id: Some(id.to_string()),
            name: Some(id.to_string()),
            chunk_type: Some(type_name.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_aliases_normalize_to_block() {
        for raw in ["block", "legacy", "doc", " Doc "] {
            assert_eq!(ChunkType::parse(raw), Some(ChunkType::Block));
        }
        assert_eq!(ChunkType::parse("line"), Some(ChunkType::Line));
        assert_eq!(ChunkType::parse("paragraph"), None);
    }

    #[test]
    fn test_type_key_alias() {
        let chunk: ChunkProfile = serde_yaml::from_str("id: c\ntype: legacy\n").unwrap();
        assert_eq!(chunk.chunk_type(), Some(ChunkType::Block));
    }

    #[test]
    fn test_kana_retry_detection() {
        let chunk: ChunkProfile =
            serde_yaml::from_str("id: c\nchunk_type: line\noptions:\n  kana_retry_threshold: 0.3\n")
                .unwrap();
        assert!(chunk.options.unwrap().has_kana_retry());
    }
}
