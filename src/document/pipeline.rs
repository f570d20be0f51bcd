use serde::{Deserialize, Serialize};

use super::{de_opt_string, non_empty, ExtraFields, Lenient};
use crate::properties::ProfileKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<Lenient<u64>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Wires one profile of every other kind into an end-to-end translation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub parser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub chunk_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub line_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_line_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PipelineSettings>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PipelineProfile {
    /// The reference slot for `kind`, or `None` for `pipeline` (pipelines never reference
    /// pipelines).
    pub fn reference(&self, kind: ProfileKind) -> Option<&str> {
        match kind {
            ProfileKind::Api => non_empty(&self.provider),
            ProfileKind::Prompt => non_empty(&self.prompt),
            ProfileKind::Parser => non_empty(&self.parser),
            ProfileKind::Policy => non_empty(&self.line_policy),
            ProfileKind::Chunk => non_empty(&self.chunk_policy),
            ProfileKind::Pipeline => None,
        }
    }

    pub fn reference_mut(&mut self, kind: ProfileKind) -> Option<&mut Option<String>> {
        match kind {
            ProfileKind::Api => Some(&mut self.provider),
            ProfileKind::Prompt => Some(&mut self.prompt),
            ProfileKind::Parser => Some(&mut self.parser),
            ProfileKind::Policy => Some(&mut self.line_policy),
            ProfileKind::Chunk => Some(&mut self.chunk_policy),
            ProfileKind::Pipeline => None,
        }
    }

    /// Whether the line policy is in effect. An unset flag follows the presence of `line_policy`.
    pub fn line_policy_applied(&self) -> bool {
        self.apply_line_policy
            .unwrap_or_else(|| non_empty(&self.line_policy).is_some())
    }

    pub fn wired(id: &str, provider: &str, prompt: &str, parser: &str, chunk: &str) -> Self {
        PipelineProfile {
            id: Some(id.to_string()),
            name: Some(id.to_string()),
            provider: Some(provider.to_string()),
            prompt: Some(prompt.to_string()),
            parser: Some(parser.to_string()),
            chunk_policy: Some(chunk.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_by_kind() {
        let mut pipeline = PipelineProfile::wired("p", "gpt", "pr", "pa", "ch");
        assert_eq!(pipeline.reference(ProfileKind::Api), Some("gpt"));
        assert_eq!(pipeline.reference(ProfileKind::Policy), None);
        assert!(!pipeline.line_policy_applied());

        *pipeline.reference_mut(ProfileKind::Policy).unwrap() = Some("strict".to_string());
        assert!(pipeline.line_policy_applied());
        pipeline.apply_line_policy = Some(false);
        assert!(!pipeline.line_policy_applied());
    }

    #[test]
    fn test_blank_reference_is_absent() {
        let pipeline: PipelineProfile = serde_yaml::from_str("id: p\nprovider: '  '\n").unwrap();
        assert_eq!(pipeline.reference(ProfileKind::Api), None);
    }
}
