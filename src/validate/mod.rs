//! # Validator
//!
//! Decides whether a profile document is well formed and whether its references to other
//! profiles hold, producing a [`ValidationReport`] of symbolic [`ValidationCode`]s. Errors block
//! a save, warnings do not.
//!
//! The validator never touches storage: the caller supplies a [`ReferenceIndex`] of known ids
//! per kind. When the index holds no ids at all for a referenced kind the check is skipped,
//! logged at `warn`, and reported as `reference_check_skipped:<kind>` so that a document can be
//! checked before its dependencies are loaded without the skip going unnoticed.
//!
//! Validation is a pure function of `(document, index)`; re-validating an unchanged document
//! gives the same report.

mod code;
mod index;
mod rules;

pub use code::{ValidationCode, ValidationReport};
pub use index::ReferenceIndex;

use crate::{
    config::ValidationConfig,
    document::{ProfileBody, ProfileDocument},
    properties::ProfileKind,
};
use rules::Pass;

#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Validator { config }
    }

    pub fn validate(&self, document: &ProfileDocument, index: &ReferenceIndex) -> ValidationReport {
        let mut pass = Pass {
            report: ValidationReport::default(),
            index,
            unknown_type_is_error: self.config.unknown_type_is_error,
        };
        match &document.body {
            ProfileBody::Api(p) => {
                pass.identity(&p.id, &p.name);
                rules::api(&mut pass, p);
            }
            ProfileBody::Pipeline(p) => {
                pass.identity(&p.id, &p.name);
                rules::pipeline(&mut pass, p);
            }
            ProfileBody::Prompt(p) => {
                pass.identity(&p.id, &p.name);
                rules::prompt(&mut pass, p);
            }
            ProfileBody::Parser(p) => {
                pass.identity(&p.id, &p.name);
                rules::parser(&mut pass, p);
            }
            ProfileBody::Policy(p) => {
                pass.identity(&p.id, &p.name);
                rules::policy(&mut pass, p);
            }
            ProfileBody::Chunk(p) => {
                pass.identity(&p.id, &p.name);
                rules::chunk(&mut pass, p);
            }
        }
        pass.report
    }

    /// Validate a document about to be saved. Unless the save overwrites an existing profile,
    /// an id already present for the same kind is `duplicate_id`.
    pub fn validate_for_save(
        &self,
        document: &ProfileDocument,
        index: &ReferenceIndex,
        allow_overwrite: bool,
    ) -> ValidationReport {
        let mut report = self.validate(document, index);
        if !allow_overwrite {
            if let Some(id) = document.id() {
                if index.contains(document.kind, id.trim()) {
                    report.error(ValidationCode::DuplicateId);
                }
            }
        }
        report
    }

    /// Parse and validate raw text. A document that cannot be parsed yields `invalid_document`.
    pub fn validate_text(
        &self,
        kind: ProfileKind,
        text: &str,
        index: &ReferenceIndex,
    ) -> ValidationReport {
        match ProfileDocument::parse(kind, text) {
            Ok(document) => self.validate(&document, index),
            Err(e) => {
                tracing::debug!("{kind} document failed to parse: {e}");
                let mut report = ValidationReport::default();
                report.error(ValidationCode::InvalidDocument);
                report
            }
        }
    }
}

/// Validate with the default configuration.
pub fn validate(document: &ProfileDocument, index: &ReferenceIndex) -> ValidationReport {
    Validator::default().validate(document, index)
}
