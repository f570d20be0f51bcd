//! Cross-reference repair after a profile is renamed or deleted.
//!
//! Every pipeline that points at the old id through the field for the target kind is patched
//! and re-saved. Repair is best effort: a pipeline that cannot be loaded or saved is logged and
//! skipped, and the rename/delete that triggered the repair is never failed by it.

use serde::{Deserialize, Serialize};

use crate::{
    properties::ProfileKind,
    store::{ProfileStore, SaveOptions},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Pipelines that were rewritten and saved
    pub updated: usize,
    /// True if at least one pipeline lost a reference with no replacement available
    pub missing_fallback: bool,
}

/// Repair pipelines after `(target, old_id)` was renamed to `new_id`, or deleted when `new_id`
/// is `None`.
///
/// On delete the reference moves to the first other stored id of `target` (ids listed in
/// order), or is removed when none exists. Removing a `line_policy` also turns
/// `apply_line_policy` off.
pub async fn reconcile(
    store: &dyn ProfileStore,
    target: ProfileKind,
    old_id: &str,
    new_id: Option<&str>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    if target.pipeline_field().is_none() {
        return report;
    }

    let replacement = match new_id {
        Some(new_id) => Some(new_id.to_string()),
        None => match store.list(target).await {
            Ok(summaries) => summaries
                .into_iter()
                .map(|s| s.id)
                .find(|id| id != old_id),
            Err(e) => {
                tracing::warn!("could not list {target} profiles for a fallback: {e}");
                None
            }
        },
    };

    let pipelines = match store.list(ProfileKind::Pipeline).await {
        Ok(pipelines) => pipelines,
        Err(e) => {
            tracing::warn!("could not list pipelines to reconcile {target}:{old_id}: {e}");
            return report;
        }
    };

    for summary in pipelines {
        let mut loaded = match store.load(ProfileKind::Pipeline, &summary.id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("skipping pipeline '{}' during reconcile: {e}", summary.id);
                continue;
            }
        };
        let Some(pipeline) = loaded.document.as_pipeline_mut() else {
            continue;
        };
        if pipeline.reference(target) != Some(old_id) {
            continue;
        }
        let Some(slot) = pipeline.reference_mut(target) else {
            continue;
        };
        *slot = replacement.clone();
        if replacement.is_none() {
            report.missing_fallback = true;
            if target == ProfileKind::Policy {
                pipeline.apply_line_policy = Some(false);
            }
        }

        let saved = match loaded.document.to_yaml() {
            Ok(text) => {
                store
                    .save(ProfileKind::Pipeline, &summary.id, &text, SaveOptions::overwrite())
                    .await
            }
            Err(e) => Err(e),
        };
        match saved {
            Ok(_) => {
                tracing::info!(
                    "pipeline '{}': {} {old_id} -> {}",
                    summary.id,
                    target.pipeline_field().unwrap_or_default(),
                    replacement.as_deref().unwrap_or("(removed)")
                );
                report.updated += 1;
            }
            Err(e) => tracing::warn!("could not save pipeline '{}': {e}", summary.id),
        }
    }
    report
}
