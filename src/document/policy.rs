use serde::{Deserialize, Serialize};

use super::{de_opt_string, non_empty, ExtraFields, Lenient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyType {
    Strict,
    Tolerant,
}

impl PolicyType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "strict" => Some(PolicyType::Strict),
            "tolerant" => Some(PolicyType::Tolerant),
            _ => None,
        }
    }
}

/// What to do when the translated line count differs from the source line count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchStrategy {
    Retry,
    Error,
    Pad,
    Truncate,
    Align,
}

impl MismatchStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "retry" => Some(MismatchStrategy::Retry),
            "error" => Some(MismatchStrategy::Error),
            "pad" => Some(MismatchStrategy::Pad),
            "truncate" => Some(MismatchStrategy::Truncate),
            "align" => Some(MismatchStrategy::Align),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCheck {
    EmptyLine,
    Similarity,
    KanaTrace,
}

impl QualityCheck {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "empty_line" => Some(QualityCheck::EmptyLine),
            "similarity" => Some(QualityCheck::Similarity),
            "kana_trace" => Some(QualityCheck::KanaTrace),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub on_mismatch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<Lenient<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PolicyOptions {
    pub fn on_mismatch(&self) -> Option<MismatchStrategy> {
        non_empty(&self.on_mismatch).and_then(MismatchStrategy::parse)
    }
}

/// A line-alignment policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_opt_string")]
    pub name: Option<String>,
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_string"
    )]
    pub policy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PolicyOptions>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl PolicyProfile {
    pub fn policy_type(&self) -> Option<PolicyType> {
        non_empty(&self.policy_type).and_then(PolicyType::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        let yaml = "id: strict\ntype: strict\noptions:\n  on_mismatch: align\n  checks: [empty_line, similarity]\n  similarity_threshold: 0.8\n";
        let policy: PolicyProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.policy_type(), Some(PolicyType::Strict));
        let options = policy.options.unwrap();
        assert_eq!(options.on_mismatch(), Some(MismatchStrategy::Align));
        assert_eq!(options.similarity_threshold, Some(Lenient::Valid(0.8)));
        assert_eq!(
            options
                .checks
                .unwrap()
                .iter()
                .filter_map(|c| QualityCheck::parse(c))
                .collect::<Vec<_>>(),
            vec![QualityCheck::EmptyLine, QualityCheck::Similarity]
        );
    }
}
