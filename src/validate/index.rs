use std::collections::{BTreeMap, BTreeSet};

use crate::{
    document::{ChunkType, ProfileDocument},
    properties::ProfileKind,
};

/// Known profile ids per kind, plus the chunk type of every chunk profile that has one.
///
/// Ids are scoped by kind: `api:default` and `prompt:default` never collide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    ids: BTreeMap<ProfileKind, BTreeSet<String>>,
    chunk_types: BTreeMap<String, ChunkType>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from already-loaded documents. Documents without an id are ignored.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a ProfileDocument>) -> Self {
        let mut index = ReferenceIndex::default();
        for doc in documents {
            index.insert_document(doc);
        }
        index
    }

    pub fn insert(&mut self, kind: ProfileKind, id: impl Into<String>) {
        self.ids.entry(kind).or_default().insert(id.into());
    }

    pub fn insert_document(&mut self, doc: &ProfileDocument) {
        let Some(id) = doc.id().map(str::trim).filter(|id| !id.is_empty()) else {
            return;
        };
        self.insert(doc.kind, id);
        if let Some(chunk_type) = doc.as_chunk().and_then(|chunk| chunk.chunk_type()) {
            self.chunk_types.insert(id.to_string(), chunk_type);
        }
    }

    pub fn with(mut self, kind: ProfileKind, ids: &[&str]) -> Self {
        for id in ids {
            self.insert(kind, *id);
        }
        self
    }

    pub fn with_chunk(mut self, id: &str, chunk_type: ChunkType) -> Self {
        self.insert(ProfileKind::Chunk, id);
        self.chunk_types.insert(id.to_string(), chunk_type);
        self
    }

    pub fn remove(&mut self, kind: ProfileKind, id: &str) {
        if let Some(ids) = self.ids.get_mut(&kind) {
            ids.remove(id);
        }
        if kind == ProfileKind::Chunk {
            self.chunk_types.remove(id);
        }
    }

    pub fn contains(&self, kind: ProfileKind, id: &str) -> bool {
        self.ids.get(&kind).is_some_and(|ids| ids.contains(id))
    }

    /// True when nothing is known about `kind`; reference checks against it are skipped.
    pub fn is_empty_for(&self, kind: ProfileKind) -> bool {
        self.ids.get(&kind).is_none_or(BTreeSet::is_empty)
    }

    pub fn ids(&self, kind: ProfileKind) -> impl Iterator<Item = &str> {
        self.ids
            .get(&kind)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    pub fn chunk_type(&self, chunk_id: &str) -> Option<ChunkType> {
        self.chunk_types.get(chunk_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_scoped_by_kind() {
        let index = ReferenceIndex::new()
            .with(ProfileKind::Api, &["default"])
            .with_chunk("lines", ChunkType::Line);
        assert!(index.contains(ProfileKind::Api, "default"));
        assert!(!index.contains(ProfileKind::Prompt, "default"));
        assert!(index.is_empty_for(ProfileKind::Prompt));
        assert_eq!(index.chunk_type("lines"), Some(ChunkType::Line));
    }

    #[test]
    fn test_from_documents_records_chunk_types() {
        let docs = [
            ProfileDocument::parse(ProfileKind::Chunk, "id: blocks\nchunk_type: legacy\n").unwrap(),
            ProfileDocument::parse(ProfileKind::Api, "name: no id\n").unwrap(),
        ];
        let mut index = ReferenceIndex::from_documents(&docs);
        assert_eq!(index.chunk_type("blocks"), Some(ChunkType::Block));
        assert!(index.is_empty_for(ProfileKind::Api));

        index.remove(ProfileKind::Chunk, "blocks");
        assert!(index.is_empty_for(ProfileKind::Chunk));
        assert_eq!(index.chunk_type("blocks"), None);
    }
}
