//! Validate-then-persist orchestration over a [`ProfileStore`].
//!
//! The manager is the only place where validation, storage and reference repair meet: a save is
//! blocked by validation errors, and a rename or delete is followed by
//! [`reconcile`](crate::reconcile::reconcile).

use std::collections::BTreeSet;

use crate::{
    config::CoreConfig,
    document::ProfileDocument,
    error::GlossaError,
    properties::{check_id, derive_id, unique_id, ProfileKey, ProfileKind},
    reconcile::{reconcile, ReconcileReport},
    store::{ProfileStore, SaveOptions, SaveOutcome},
    validate::{ReferenceIndex, ValidationReport, Validator},
};

pub struct ProfileManager<S> {
    store: S,
    validator: Validator,
}

impl<S: ProfileStore> ProfileManager<S> {
    pub fn new(store: S) -> Self {
        ProfileManager {
            store,
            validator: Validator::default(),
        }
    }

    pub fn with_config(store: S, config: &CoreConfig) -> Self {
        ProfileManager {
            store,
            validator: Validator::new(config.validation.clone()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Known ids of every kind, with chunk types read from the stored chunk profiles.
    pub async fn reference_index(&self) -> Result<ReferenceIndex, GlossaError> {
        let mut index = ReferenceIndex::new();
        for kind in ProfileKind::ALL {
            for summary in self.store.list(kind).await? {
                if kind != ProfileKind::Chunk {
                    index.insert(kind, summary.id);
                    continue;
                }
                match self.store.load(kind, &summary.id).await {
                    Ok(loaded) => index.insert_document(&loaded.document),
                    Err(e) => {
                        tracing::warn!("chunk '{}' unreadable, type unknown: {e}", summary.id);
                        index.insert(kind, summary.id);
                    }
                }
            }
        }
        Ok(index)
    }

    /// Validate raw text against the current store contents without saving it.
    pub async fn validate(
        &self,
        kind: ProfileKind,
        raw_text: &str,
    ) -> Result<ValidationReport, GlossaError> {
        let index = self.reference_index().await?;
        Ok(self.validator.validate_text(kind, raw_text, &index))
    }

    /// Parse, validate and persist a profile. Validation errors block the save and are returned
    /// as [`GlossaError::Validation`]; warnings ride along in the outcome.
    pub async fn save(
        &self,
        kind: ProfileKind,
        raw_text: &str,
        allow_overwrite: bool,
    ) -> Result<SaveOutcome, GlossaError> {
        let document = ProfileDocument::parse(kind, raw_text)?;
        let index = self.reference_index().await?;
        let report = self
            .validator
            .validate_for_save(&document, &index, allow_overwrite);
        if !report.is_ok() {
            return Err(GlossaError::Validation(report.error_codes()));
        }
        let id = document
            .id()
            .map(str::trim)
            .ok_or_else(|| GlossaError::Validation(vec!["missing_id".to_string()]))?;
        let mut outcome = self
            .store
            .save(kind, id, raw_text, SaveOptions { allow_overwrite })
            .await?;
        let mut warnings = report.warning_codes();
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Suggest an unused id for a new profile of `kind` named `name`.
    pub async fn suggest_id(&self, kind: ProfileKind, name: &str) -> Result<String, GlossaError> {
        let taken: BTreeSet<String> = self
            .store
            .list(kind)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        Ok(unique_id(&derive_id(name), &taken))
    }

    /// Move `(kind, old_id)` to `new_id` and repoint every pipeline that referenced it.
    pub async fn rename(
        &self,
        kind: ProfileKind,
        old_id: &str,
        new_id: &str,
    ) -> Result<ReconcileReport, GlossaError> {
        check_id(new_id)?;
        if old_id == new_id {
            return Ok(ReconcileReport::default());
        }
        if self
            .store
            .list(kind)
            .await?
            .iter()
            .any(|s| s.id == new_id)
        {
            return Err(GlossaError::Conflict(ProfileKey::new(kind, new_id).to_string()));
        }
        let mut loaded = self.store.load(kind, old_id).await?;
        loaded.document.set_id(new_id);
        let text = loaded.document.to_yaml()?;
        self.store
            .save(kind, new_id, &text, SaveOptions::default())
            .await?;
        self.store.delete(kind, old_id).await?;
        tracing::info!("renamed {kind}:{old_id} to {new_id}");
        Ok(reconcile(&self.store, kind, old_id, Some(new_id)).await)
    }

    /// Delete `(kind, id)` and repair the pipelines that referenced it.
    pub async fn delete(&self, kind: ProfileKind, id: &str) -> Result<ReconcileReport, GlossaError> {
        self.store.delete(kind, id).await?;
        tracing::info!("deleted {kind}:{id}");
        Ok(reconcile(&self.store, kind, id, None).await)
    }
}
