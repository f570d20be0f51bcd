//! Symbolic validation codes and the report that collects them.

use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

use crate::properties::{ProfileKind, ProfileKindSet};

/// One machine-readable validation finding.
///
/// The `Display` form is the stable symbolic code (`invalid_timeout`,
/// `missing_reference:api:gpt4`, ...). Turning codes into user-facing text is left to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    // identity
    MissingId,
    InvalidId,
    InvalidDocument,
    DuplicateId,
    MissingName,

    // api
    MissingApiType,
    UnknownApiType,
    MissingBaseUrl,
    InvalidBaseUrl,
    MissingModel,
    MissingPoolEndpoints,
    InvalidPoolEndpoint,
    PoolMembersWithEndpoints,
    PoolMembersDeprecated,
    InvalidTimeout,
    InvalidConcurrency,
    InvalidRpm,
    InvalidMaxRetries,

    // pipeline
    MissingProvider,
    MissingPrompt,
    MissingParser,
    MissingChunkPolicy,
    MissingReference { kind: ProfileKind, id: String },
    ReferenceCheckSkipped(ProfileKind),
    LinePolicyRequiresLineChunk,
    LineChunkMissingLinePolicy,
    LinePolicyUnused,
    InvalidBatchSize,

    // prompt
    MissingSourcePlaceholder,
    InvalidContextBeforeLines,
    InvalidContextAfterLines,
    InvalidContextSourceLines,

    // parser
    MissingParserType,
    UnknownParserType,
    /// A parser rule that cannot compile, carrying the interpreter's failure code
    Parser(&'static str),

    // policy
    InvalidPolicyType,
    InvalidOnMismatch,
    InvalidSimilarityThreshold,
    UnknownQualityCheck,

    // chunk
    InvalidChunkType,
    InvalidTargetChars,
    InvalidMaxChars,
    MaxCharsBelowTarget,
    InvalidBalanceThreshold,
    InvalidBalanceCount,
    InvalidRetryThreshold,
    InvalidRetryMinChars,
    KanaRetryIgnoredForLineChunk,
}

impl ValidationCode {
    fn as_static(&self) -> Option<&'static str> {
        use ValidationCode::*;
        let code = match self {
            MissingId => "missing_id",
            InvalidId => "invalid_id",
            InvalidDocument => "invalid_document",
            DuplicateId => "duplicate_id",
            MissingName => "missing_name",
            MissingApiType => "missing_api_type",
            UnknownApiType => "unknown_api_type",
            MissingBaseUrl => "missing_base_url",
            InvalidBaseUrl => "invalid_base_url",
            MissingModel => "missing_model",
            MissingPoolEndpoints => "missing_pool_endpoints",
            InvalidPoolEndpoint => "invalid_pool_endpoint",
            PoolMembersWithEndpoints => "pool_members_with_endpoints",
            PoolMembersDeprecated => "pool_members_deprecated",
            InvalidTimeout => "invalid_timeout",
            InvalidConcurrency => "invalid_concurrency",
            InvalidRpm => "invalid_rpm",
            InvalidMaxRetries => "invalid_max_retries",
            MissingProvider => "missing_provider",
            MissingPrompt => "missing_prompt",
            MissingParser => "missing_parser",
            MissingChunkPolicy => "missing_chunk_policy",
            LinePolicyRequiresLineChunk => "line_policy_requires_line_chunk",
            LineChunkMissingLinePolicy => "line_chunk_missing_line_policy",
            LinePolicyUnused => "line_policy_unused",
            InvalidBatchSize => "invalid_batch_size",
            MissingSourcePlaceholder => "missing_source_placeholder",
            InvalidContextBeforeLines => "invalid_context_before_lines",
            InvalidContextAfterLines => "invalid_context_after_lines",
            InvalidContextSourceLines => "invalid_context_source_lines",
            MissingParserType => "missing_parser_type",
            UnknownParserType => "unknown_parser_type",
            InvalidPolicyType => "invalid_policy_type",
            InvalidOnMismatch => "invalid_on_mismatch",
            InvalidSimilarityThreshold => "invalid_similarity_threshold",
            UnknownQualityCheck => "unknown_quality_check",
            InvalidChunkType => "invalid_chunk_type",
            InvalidTargetChars => "invalid_target_chars",
            InvalidMaxChars => "invalid_max_chars",
            MaxCharsBelowTarget => "max_chars_below_target",
            InvalidBalanceThreshold => "invalid_balance_threshold",
            InvalidBalanceCount => "invalid_balance_count",
            InvalidRetryThreshold => "invalid_retry_threshold",
            InvalidRetryMinChars => "invalid_retry_min_chars",
            KanaRetryIgnoredForLineChunk => "kana_retry_ignored_for_line_chunk",
            MissingReference { .. } | ReferenceCheckSkipped(_) | Parser(_) => return None,
        };
        Some(code)
    }
}

impl Display for ValidationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationCode::MissingReference { kind, id } => {
                write!(f, "missing_reference:{kind}:{id}")
            }
            ValidationCode::ReferenceCheckSkipped(kind) => {
                write!(f, "reference_check_skipped:{kind}")
            }
            ValidationCode::Parser(code) => write!(f, "parser_{code}"),
            other => f.write_str(other.as_static().unwrap_or_default()),
        }
    }
}

impl Serialize for ValidationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors and warnings from one validation pass.
///
/// Codes are kept in first-seen order and pushed at most once each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationCode>,
    pub warnings: Vec<ValidationCode>,
    /// Kinds whose cross-reference check was skipped for lack of an index
    #[serde(skip)]
    pub skipped: ProfileKindSet,
}

impl ValidationReport {
    pub fn error(&mut self, code: ValidationCode) {
        if !self.errors.contains(&code) {
            self.errors.push(code);
        }
    }

    pub fn warn(&mut self, code: ValidationCode) {
        if !self.warnings.contains(&code) {
            self.warnings.push(code);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_codes(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_codes(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}
