//! Profile persistence seam.
//!
//! The rest of the crate only talks to storage through [`ProfileStore`], awaiting one call at a
//! time. Two implementations ship with the crate: [`MemoryProfileStore`] for tests and live
//! previews, and [`DirProfileStore`], which keeps one file per profile under
//! `<root>/<kind>/<id>.<extension>`.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{
    config::StoreConfig,
    document::ProfileDocument,
    error::GlossaError,
    properties::{check_id, ProfileKey, ProfileKind},
};

/// One entry of a [`ProfileStore::list`] result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: Option<String>,
}

/// A stored profile: the parsed document and the exact text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProfile {
    pub document: ProfileDocument,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub allow_overwrite: bool,
}

impl SaveOptions {
    pub fn overwrite() -> Self {
        SaveOptions {
            allow_overwrite: true,
        }
    }
}

/// Result of a successful save. Stores may attach advisory warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub warnings: Vec<String>,
}

/// Key-value persistence keyed by `(kind, id)`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Ids (sorted) and display names of every stored profile of `kind`.
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, GlossaError>;

    async fn load(&self, kind: ProfileKind, id: &str) -> Result<LoadedProfile, GlossaError>;

    /// Persist `raw_text` as `(kind, id)`. Fails with [`GlossaError::Conflict`] when the profile
    /// exists and `options.allow_overwrite` is false.
    async fn save(
        &self,
        kind: ProfileKind,
        id: &str,
        raw_text: &str,
        options: SaveOptions,
    ) -> Result<SaveOutcome, GlossaError>;

    async fn delete(&self, kind: ProfileKind, id: &str) -> Result<(), GlossaError>;
}

fn summarize(kind: ProfileKind, id: String, text: &str) -> ProfileSummary {
    let name = match ProfileDocument::parse(kind, text) {
        Ok(doc) => doc.name().map(str::to_string),
        Err(e) => {
            tracing::debug!("{kind}:{id} is unreadable, listing without a name: {e}");
            None
        }
    };
    ProfileSummary { id, name }
}

fn load_text(kind: ProfileKind, raw_text: String) -> Result<LoadedProfile, GlossaError> {
    Ok(LoadedProfile {
        document: ProfileDocument::parse(kind, &raw_text)?,
        raw_text,
    })
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<BTreeMap<ProfileKey, String>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text currently stored under `(kind, id)`.
    pub fn raw(&self, kind: ProfileKind, id: &str) -> Option<String> {
        self.profiles.read().get(&ProfileKey::new(kind, id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, GlossaError> {
        let profiles = self.profiles.read();
        Ok(profiles
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(key, text)| summarize(kind, key.id.clone(), text))
            .collect())
    }

    async fn load(&self, kind: ProfileKind, id: &str) -> Result<LoadedProfile, GlossaError> {
        let key = ProfileKey::new(kind, id);
        let text = self
            .profiles
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| GlossaError::NotFound(key.to_string()))?;
        load_text(kind, text)
    }

    async fn save(
        &self,
        kind: ProfileKind,
        id: &str,
        raw_text: &str,
        options: SaveOptions,
    ) -> Result<SaveOutcome, GlossaError> {
        check_id(id)?;
        let key = ProfileKey::new(kind, id);
        let mut profiles = self.profiles.write();
        if !options.allow_overwrite && profiles.contains_key(&key) {
            return Err(GlossaError::Conflict(key.to_string()));
        }
        profiles.insert(key, raw_text.to_string());
        Ok(SaveOutcome::default())
    }

    async fn delete(&self, kind: ProfileKind, id: &str) -> Result<(), GlossaError> {
        let key = ProfileKey::new(kind, id);
        match self.profiles.write().remove(&key) {
            Some(_) => Ok(()),
            None => Err(GlossaError::NotFound(key.to_string())),
        }
    }
}

/// Directory-backed store: `<root>/<kind>/<id>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirProfileStore {
    root: PathBuf,
    extension: String,
}

impl DirProfileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirProfileStore {
            root: root.as_ref().to_path_buf(),
            extension: "yaml".to_string(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        DirProfileStore {
            root: config.root.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: ProfileKind) -> PathBuf {
        self.root.join(kind.as_str())
    }

    /// File path for `(kind, id)`. Unsafe ids never reach the filesystem.
    pub fn profile_path(&self, kind: ProfileKind, id: &str) -> Result<PathBuf, GlossaError> {
        check_id(id)?;
        Ok(self
            .kind_dir(kind)
            .join(format!("{id}.{}", self.extension)))
    }

    fn stored_ids(&self, kind: ProfileKind) -> Vec<(String, PathBuf)> {
        let dir = self.kind_dir(kind);
        if !dir.is_dir() {
            return Vec::new();
        }
        let mut ids = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    tracing::warn!("skipping unreadable entry under {:?}: {e}", dir);
                    None
                }
            })
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == self.extension)
            })
            .filter_map(|p| {
                let stem = p.file_stem()?.to_str()?.to_string();
                check_id(&stem).ok().map(|_| (stem, p))
            })
            .collect::<Vec<_>>();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids
    }
}

#[async_trait]
impl ProfileStore for DirProfileStore {
    async fn list(&self, kind: ProfileKind) -> Result<Vec<ProfileSummary>, GlossaError> {
        let mut summaries = Vec::new();
        for (id, path) in self.stored_ids(kind) {
            let text = tokio::fs::read_to_string(&path).await?;
            summaries.push(summarize(kind, id, &text));
        }
        Ok(summaries)
    }

    async fn load(&self, kind: ProfileKind, id: &str) -> Result<LoadedProfile, GlossaError> {
        let path = self.profile_path(kind, id)?;
        tracing::debug!("Reading {:?}", path);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    GlossaError::NotFound(ProfileKey::new(kind, id).to_string())
                }
                _ => GlossaError::from(e),
            })?;
        load_text(kind, text)
    }

    async fn save(
        &self,
        kind: ProfileKind,
        id: &str,
        raw_text: &str,
        options: SaveOptions,
    ) -> Result<SaveOutcome, GlossaError> {
        let path = self.profile_path(kind, id)?;
        if !options.allow_overwrite && tokio::fs::try_exists(&path).await? {
            return Err(GlossaError::Conflict(ProfileKey::new(kind, id).to_string()));
        }
        tokio::fs::create_dir_all(self.kind_dir(kind)).await?;
        tokio::fs::write(&path, raw_text).await?;
        tracing::info!("saved {kind}:{id} to {:?}", path);
        Ok(SaveOutcome::default())
    }

    async fn delete(&self, kind: ProfileKind, id: &str) -> Result<(), GlossaError> {
        let path = self.profile_path(kind, id)?;
        tokio::fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                GlossaError::NotFound(ProfileKey::new(kind, id).to_string())
            }
            _ => GlossaError::from(e),
        })?;
        tracing::info!("deleted {kind}:{id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const API: &str = "id: gpt\nname: GPT\ntype: openai_compat\n";

    #[test(tokio::test)]
    async fn test_memory_store_crud() {
        let store = MemoryProfileStore::new();
        store
            .save(ProfileKind::Api, "gpt", API, SaveOptions::default())
            .await
            .unwrap();
        let err = store
            .save(ProfileKind::Api, "gpt", API, SaveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::Conflict(_)));
        store
            .save(ProfileKind::Api, "gpt", API, SaveOptions::overwrite())
            .await
            .unwrap();

        let listed = store.list(ProfileKind::Api).await.unwrap();
        assert_eq!(
            listed,
            vec![ProfileSummary {
                id: "gpt".to_string(),
                name: Some("GPT".to_string())
            }]
        );
        assert!(store.list(ProfileKind::Prompt).await.unwrap().is_empty());

        let loaded = store.load(ProfileKind::Api, "gpt").await.unwrap();
        assert_eq!(loaded.raw_text, API);
        assert_eq!(loaded.document.id(), Some("gpt"));

        store.delete(ProfileKind::Api, "gpt").await.unwrap();
        assert!(matches!(
            store.load(ProfileKind::Api, "gpt").await.unwrap_err(),
            GlossaError::NotFound(_)
        ));
    }

    #[test(tokio::test)]
    async fn test_memory_store_rejects_unsafe_ids() {
        let store = MemoryProfileStore::new();
        let err = store
            .save(ProfileKind::Api, "../x", API, SaveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GlossaError::InvalidId(_)));
    }
}
