//! Reference repair over a profile directory
//!
//! Renames and deletes go through `ProfileManager`, which reconciles every pipeline on disk.

mod common;

use common::*;
use glossa_core::{
    manager::ProfileManager,
    properties::ProfileKind,
    reconcile::reconcile,
    store::{DirProfileStore, ProfileStore},
};
use tempfile::TempDir;
use test_log::test;

async fn pipeline_text(store: &DirProfileStore, id: &str) -> String {
    store
        .load(ProfileKind::Pipeline, id)
        .await
        .unwrap()
        .raw_text
}

#[test(tokio::test)]
async fn test_rename_api_updates_every_referencing_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_profile_tree(&temp_dir);
    write_profile(&root, "pipeline", "second", &pipeline("second", "gpt"));
    write_profile(&root, "api", "claude", API_CLAUDE);
    write_profile(&root, "pipeline", "third", &pipeline("third", "claude"));
    let manager = ProfileManager::new(DirProfileStore::new(&root));

    let report = manager
        .rename(ProfileKind::Api, "gpt", "gpt4")
        .await
        .unwrap();
    assert_eq!(report.updated, 2);
    assert!(!report.missing_fallback);

    assert!(root.join("api/gpt4.yaml").is_file());
    assert!(!root.join("api/gpt.yaml").exists());
    for id in ["main", "second"] {
        let loaded = manager.store().load(ProfileKind::Pipeline, id).await.unwrap();
        let pipeline = loaded.document.as_pipeline().unwrap();
        assert_eq!(pipeline.provider.as_deref(), Some("gpt4"));
        // fields the pipeline form never models survive the rewrite
        assert!(loaded.raw_text.contains("temperature"));
    }
    let third = pipeline_text(manager.store(), "third").await;
    assert!(third.contains("provider: claude"));

    // renamed profile carries its new id
    let api = manager.store().load(ProfileKind::Api, "gpt4").await.unwrap();
    assert_eq!(api.document.id(), Some("gpt4"));
}

#[test(tokio::test)]
async fn test_delete_last_api_leaves_pipelines_without_provider() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_profile_tree(&temp_dir);
    write_profile(&root, "pipeline", "second", &pipeline("second", "gpt"));
    let manager = ProfileManager::new(DirProfileStore::new(&root));

    let report = manager.delete(ProfileKind::Api, "gpt").await.unwrap();
    assert_eq!(report.updated, 2);
    assert!(report.missing_fallback);

    for id in ["main", "second"] {
        let loaded = manager.store().load(ProfileKind::Pipeline, id).await.unwrap();
        assert_eq!(loaded.document.as_pipeline().unwrap().provider, None);
        assert!(!loaded.raw_text.contains("provider"));
    }
}

#[test(tokio::test)]
async fn test_delete_line_policy_turns_application_off() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_profile_tree(&temp_dir);
    let manager = ProfileManager::new(DirProfileStore::new(&root));

    let report = manager.delete(ProfileKind::Policy, "strict").await.unwrap();
    assert_eq!(report.updated, 1);
    assert!(report.missing_fallback);

    let loaded = manager
        .store()
        .load(ProfileKind::Pipeline, "main")
        .await
        .unwrap();
    let pipeline = loaded.document.as_pipeline().unwrap();
    assert_eq!(pipeline.line_policy, None);
    assert_eq!(pipeline.apply_line_policy, Some(false));

    // the repaired pipeline still validates against what is left on disk
    let report = manager
        .validate(ProfileKind::Pipeline, &loaded.raw_text)
        .await
        .unwrap();
    assert!(report.is_ok(), "{:?}", report.errors);
}

#[test(tokio::test)]
async fn test_unrelated_id_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_profile_tree(&temp_dir);
    let before = std::fs::read_to_string(root.join("pipeline/main.yaml")).unwrap();
    let store = DirProfileStore::new(&root);

    let report = reconcile(&store, ProfileKind::Prompt, "nonexistent", Some("other")).await;
    assert_eq!(report.updated, 0);
    assert!(!report.missing_fallback);
    assert_eq!(
        std::fs::read_to_string(root.join("pipeline/main.yaml")).unwrap(),
        before
    );
}
