//! Per-kind rule sets. Every function here only reads the document and the reference index and
//! pushes codes into the pass; none of them stop at the first problem.

use url::Url;

use super::{ReferenceIndex, ValidationCode as Code, ValidationReport};
use crate::{
    document::{
        non_empty, ApiEndpoint, ApiProfile, ApiType, ChunkProfile, ChunkType, Lenient,
        ParserProfile, ParserType, PipelineProfile, PolicyProfile, PromptProfile, QualityCheck,
        SourceFormat,
    },
    parser::{ParseFailure, ParserRule},
    properties::{is_valid_id, ProfileKind},
};

pub(crate) struct Pass<'a> {
    pub report: ValidationReport,
    pub index: &'a ReferenceIndex,
    pub unknown_type_is_error: bool,
}

impl Pass<'_> {
    fn error(&mut self, code: Code) {
        self.report.error(code);
    }

    fn warn(&mut self, code: Code) {
        self.report.warn(code);
    }

    /// Unknown discriminators are tolerated unless configured otherwise.
    fn unknown_type(&mut self, code: Code) {
        if self.unknown_type_is_error {
            self.error(code);
        } else {
            self.warn(code);
        }
    }

    /// Check `id` against the index for `kind`, skipping (with a warning) when the index knows
    /// nothing about that kind.
    fn reference(&mut self, kind: ProfileKind, id: &str) {
        if self.index.is_empty_for(kind) {
            tracing::warn!("skipping {kind} reference check for '{id}': no {kind} profiles indexed");
            self.report.skipped.0.insert(kind);
            self.warn(Code::ReferenceCheckSkipped(kind));
        } else if !self.index.contains(kind, id) {
            self.error(Code::MissingReference {
                kind,
                id: id.to_string(),
            });
        }
    }

    pub fn identity(&mut self, id: &Option<String>, name: &Option<String>) {
        match non_empty(id) {
            None => self.error(Code::MissingId),
            Some(id) if !is_valid_id(id) => self.error(Code::InvalidId),
            Some(_) => {}
        }
        if non_empty(name).is_none() {
            self.warn(Code::MissingName);
        }
    }
}

fn invalid_count(value: &Option<Lenient<u64>>) -> bool {
    matches!(value, Some(Lenient::Invalid(_)))
}

/// Thresholds live in `(0, 1]`.
fn invalid_ratio(value: &Option<Lenient<f64>>) -> bool {
    match value {
        None => false,
        Some(Lenient::Valid(v)) => !(*v > 0.0 && *v <= 1.0),
        Some(Lenient::Invalid(_)) => true,
    }
}

fn invalid_base_url(base_url: &str) -> bool {
    match Url::parse(base_url) {
        Ok(url) => !matches!(url.scheme(), "http" | "https") || url.host().is_none(),
        Err(_) => true,
    }
}

pub(crate) fn api(pass: &mut Pass, profile: &ApiProfile) {
    if invalid_count(&profile.timeout) {
        pass.error(Code::InvalidTimeout);
    }
    if invalid_count(&profile.concurrency) {
        pass.error(Code::InvalidConcurrency);
    }
    if invalid_count(&profile.rpm) {
        pass.error(Code::InvalidRpm);
    }
    if invalid_count(&profile.max_retries) {
        pass.error(Code::InvalidMaxRetries);
    }

    let Some(type_name) = non_empty(&profile.api_type) else {
        pass.error(Code::MissingApiType);
        return;
    };
    match ApiType::parse(type_name) {
        Some(ApiType::OpenaiCompat) => {
            match non_empty(&profile.base_url) {
                None => pass.error(Code::MissingBaseUrl),
                Some(url) if invalid_base_url(url) => pass.error(Code::InvalidBaseUrl),
                Some(_) => {}
            }
            if non_empty(&profile.model).is_none() {
                pass.error(Code::MissingModel);
            }
        }
        Some(ApiType::Pool) => pool(pass, profile),
        None => pass.unknown_type(Code::UnknownApiType),
    }
}

fn pool(pass: &mut Pass, profile: &ApiProfile) {
    let endpoints: &[ApiEndpoint] = profile.endpoints.as_deref().unwrap_or_default();
    let members: Vec<&str> = profile
        .members
        .iter()
        .flatten()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();

    if !endpoints.is_empty() && !members.is_empty() {
        pass.error(Code::PoolMembersWithEndpoints);
    }

    if endpoints.is_empty() {
        if members.is_empty() {
            pass.error(Code::MissingPoolEndpoints);
        } else {
            pass.warn(Code::PoolMembersDeprecated);
            for member in members {
                pass.reference(ProfileKind::Api, member);
            }
        }
        return;
    }

    for endpoint in endpoints {
        if !endpoint.is_complete() || invalid_count(&endpoint.weight) {
            pass.error(Code::InvalidPoolEndpoint);
        }
        if let Some(url) = non_empty(&endpoint.base_url) {
            if invalid_base_url(url) {
                pass.error(Code::InvalidBaseUrl);
            }
        }
    }
    if !endpoints.iter().any(ApiEndpoint::is_complete) {
        pass.error(Code::MissingPoolEndpoints);
    }
}

pub(crate) fn pipeline(pass: &mut Pass, profile: &PipelineProfile) {
    let required = [
        (ProfileKind::Api, Code::MissingProvider),
        (ProfileKind::Prompt, Code::MissingPrompt),
        (ProfileKind::Parser, Code::MissingParser),
        (ProfileKind::Chunk, Code::MissingChunkPolicy),
    ];
    for (kind, missing) in required {
        match profile.reference(kind) {
            Some(id) => pass.reference(kind, id),
            None => pass.error(missing),
        }
    }

    let line_policy = profile.reference(ProfileKind::Policy);
    if let Some(id) = line_policy {
        pass.reference(ProfileKind::Policy, id);
    }

    let applied = profile.line_policy_applied();
    let chunk_type = profile
        .reference(ProfileKind::Chunk)
        .and_then(|id| pass.index.chunk_type(id));
    match chunk_type {
        Some(ChunkType::Block) if applied => pass.error(Code::LinePolicyRequiresLineChunk),
        Some(ChunkType::Line) if applied && line_policy.is_none() => {
            pass.error(Code::LineChunkMissingLinePolicy)
        }
        // chunk type unknown: only an explicit request without a policy is contradictory
        None if profile.apply_line_policy == Some(true) && line_policy.is_none() => {
            pass.error(Code::LineChunkMissingLinePolicy)
        }
        _ => {}
    }
    if line_policy.is_some() && !applied {
        pass.warn(Code::LinePolicyUnused);
    }

    if let Some(settings) = &profile.settings {
        if invalid_count(&settings.batch_size) {
            pass.error(Code::InvalidBatchSize);
        }
        if invalid_count(&settings.concurrency) {
            pass.error(Code::InvalidConcurrency);
        }
    }
}

pub(crate) fn prompt(pass: &mut Pass, profile: &PromptProfile) {
    if !profile.has_source_slot() {
        pass.error(Code::MissingSourcePlaceholder);
    }
    let Some(context) = &profile.context else {
        return;
    };
    if invalid_count(&context.before_lines) {
        pass.error(Code::InvalidContextBeforeLines);
    }
    if invalid_count(&context.after_lines) {
        pass.error(Code::InvalidContextAfterLines);
    }
    if context.source_format() == Some(SourceFormat::Jsonl) && invalid_count(&context.source_lines)
    {
        pass.error(Code::InvalidContextSourceLines);
    }
}

pub(crate) fn parser(pass: &mut Pass, profile: &ParserProfile) {
    let spec = profile.spec();
    let Some(type_name) = spec.type_name() else {
        pass.error(Code::MissingParserType);
        return;
    };
    if ParserType::parse(type_name).is_none() {
        pass.unknown_type(Code::UnknownParserType);
        return;
    }
    match ParserRule::compile(&spec) {
        Ok(ParserRule::Any(branches)) => {
            for failure in branches.iter().filter_map(|b| b.as_ref().err()) {
                parser_failure(pass, failure);
            }
        }
        Ok(_) => {}
        Err(failure) => parser_failure(pass, &failure),
    }
}

fn parser_failure(pass: &mut Pass, failure: &ParseFailure) {
    match failure {
        ParseFailure::UnsupportedParser(_) => pass.unknown_type(Code::UnknownParserType),
        other => pass.error(Code::Parser(other.code())),
    }
}

pub(crate) fn policy(pass: &mut Pass, profile: &PolicyProfile) {
    if profile.policy_type().is_none() {
        pass.error(Code::InvalidPolicyType);
    }
    let Some(options) = &profile.options else {
        return;
    };
    if non_empty(&options.on_mismatch).is_some() && options.on_mismatch().is_none() {
        pass.error(Code::InvalidOnMismatch);
    }
    if invalid_ratio(&options.similarity_threshold) {
        pass.error(Code::InvalidSimilarityThreshold);
    }
    for check in options.checks.iter().flatten() {
        if QualityCheck::parse(check).is_none() {
            pass.warn(Code::UnknownQualityCheck);
        }
    }
}

pub(crate) fn chunk(pass: &mut Pass, profile: &ChunkProfile) {
    let chunk_type = profile.chunk_type();
    if chunk_type.is_none() {
        pass.error(Code::InvalidChunkType);
    }
    let Some(options) = &profile.options else {
        return;
    };

    let target = options.target_chars.as_ref().map(Lenient::valid);
    let max = options.max_chars.as_ref().map(Lenient::valid);
    if matches!(target, Some(None) | Some(Some(0))) {
        pass.error(Code::InvalidTargetChars);
    }
    if matches!(max, Some(None) | Some(Some(0))) {
        pass.error(Code::InvalidMaxChars);
    }
    if let (Some(Some(target)), Some(Some(max))) = (target, max) {
        if max < target {
            pass.error(Code::MaxCharsBelowTarget);
        }
    }
    if invalid_ratio(&options.balance_threshold) {
        pass.error(Code::InvalidBalanceThreshold);
    }
    if invalid_count(&options.balance_count) {
        pass.error(Code::InvalidBalanceCount);
    }

    if chunk_type == Some(ChunkType::Line) {
        if options.has_kana_retry() {
            pass.warn(Code::KanaRetryIgnoredForLineChunk);
        }
        return;
    }
    if invalid_ratio(&options.kana_retry_threshold) {
        pass.error(Code::InvalidRetryThreshold);
    }
    if matches!(
        options.kana_retry_min_chars.as_ref().map(Lenient::valid),
        Some(None) | Some(Some(0))
    ) {
        pass.error(Code::InvalidRetryMinChars);
    }
}
