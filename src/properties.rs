//! Profile kinds, identifiers, and the composite `(kind, id)` key.
//!
//! Ids are unique *within* a kind only. Everything that needs a uniqueness check
//! keys by [`ProfileKey`] (or a per-kind set) so that an `api` profile named `default`
//! never blocks a `prompt` profile named `default`.
pub use enumset::EnumSet;

use enumset::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    ops::Deref,
    str::FromStr,
};
use unicode_normalization::UnicodeNormalization;

use crate::error::GlossaError;

static PROFILE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("profile id pattern to be a valid regex")
});

/// The six profile families a translation pipeline is assembled from.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[serde(rename_all = "lowercase")]
#[enumset(repr = "u8")]
pub enum ProfileKind {
    /// Endpoint and model settings for an LLM provider (or a pool of them)
    Api,
    /// The composite profile that wires one profile of every other kind together
    Pipeline,
    /// System/user templates and source context settings
    Prompt,
    /// Output parser grammar used to pull translated text out of a model response
    Parser,
    /// Line alignment policy
    Policy,
    /// Chunking strategy
    Chunk,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 6] = [
        ProfileKind::Api,
        ProfileKind::Pipeline,
        ProfileKind::Prompt,
        ProfileKind::Parser,
        ProfileKind::Policy,
        ProfileKind::Chunk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Api => "api",
            ProfileKind::Pipeline => "pipeline",
            ProfileKind::Prompt => "prompt",
            ProfileKind::Parser => "parser",
            ProfileKind::Policy => "policy",
            ProfileKind::Chunk => "chunk",
        }
    }

    /// The pipeline field that references a profile of this kind, if any.
    pub fn pipeline_field(&self) -> Option<&'static str> {
        match self {
            ProfileKind::Api => Some("provider"),
            ProfileKind::Prompt => Some("prompt"),
            ProfileKind::Parser => Some("parser"),
            ProfileKind::Policy => Some("line_policy"),
            ProfileKind::Chunk => Some("chunk_policy"),
            ProfileKind::Pipeline => None,
        }
    }
}

impl Display for ProfileKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = GlossaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "api" => Ok(ProfileKind::Api),
            "pipeline" => Ok(ProfileKind::Pipeline),
            "prompt" => Ok(ProfileKind::Prompt),
            "parser" => Ok(ProfileKind::Parser),
            "policy" => Ok(ProfileKind::Policy),
            "chunk" => Ok(ProfileKind::Chunk),
            other => Err(GlossaError::NotFound(format!("unknown profile kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileKindSet(pub EnumSet<ProfileKind>);

impl Deref for ProfileKindSet {
    type Target = EnumSet<ProfileKind>;
    fn deref(&self) -> &EnumSet<ProfileKind> {
        &self.0
    }
}

impl From<EnumSet<ProfileKind>> for ProfileKindSet {
    fn from(kinds: EnumSet<ProfileKind>) -> Self {
        ProfileKindSet(kinds)
    }
}

impl Display for ProfileKindSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names = self.0.iter().map(|k| k.as_str()).collect::<Vec<_>>();
        write!(f, "{}", names.join("|"))
    }
}

/// Returns true if `id` is safe to use as a profile id (and therefore as a file stem).
pub fn is_valid_id(id: &str) -> bool {
    PROFILE_ID_RE.is_match(id) && !id.contains("..")
}

/// Validated profile id check returning the crate error on failure.
pub fn check_id(id: &str) -> Result<(), GlossaError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(GlossaError::InvalidId(id.to_string()))
    }
}

/// Derive an id from a display name: NFKD-fold to ASCII, lowercase, and squash every run of
/// characters outside `[a-z0-9-]` into a single `_`.
pub fn derive_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.nfkd() {
        if c.is_ascii_alphanumeric() || c == '-' {
            if pending_sep && !id.is_empty() {
                id.push('_');
            }
            pending_sep = false;
            id.push(c.to_ascii_lowercase());
        } else if !c.is_ascii() && !c.is_alphanumeric() {
            // combining marks left over from decomposition
            continue;
        } else {
            pending_sep = true;
        }
    }
    if id.is_empty() || id.starts_with('-') {
        id.insert_str(0, "profile");
    }
    id
}

/// Make `base` unique against the ids already taken within one kind by appending `_2`, `_3`, ...
pub fn unique_id(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Composite key identifying one stored profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    pub kind: ProfileKind,
    pub id: String,
}

impl ProfileKey {
    pub fn new(kind: ProfileKind, id: impl Into<String>) -> Self {
        ProfileKey {
            kind,
            id: id.into(),
        }
    }
}

impl Display for ProfileKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_safety() {
        assert!(is_valid_id("gpt4_main"));
        assert!(is_valid_id("_hidden.v2-beta"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("-leading"));
        assert!(!is_valid_id("a..b"));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id("a\\b"));
        assert!(!is_valid_id("has space"));
        assert!(check_id("..").is_err());
    }

    #[test]
    fn test_derive_id() {
        assert_eq!(derive_id("GPT-4 Main"), "gpt-4_main");
        assert_eq!(derive_id("  Café Crème  "), "cafe_creme");
        assert_eq!(derive_id("日本語"), "profile");
        assert!(is_valid_id(&derive_id("Ünïcode / path ../ tricks")));
    }

    #[test]
    fn test_unique_id() {
        let taken: BTreeSet<String> = ["base".to_string(), "base_2".to_string()].into();
        assert_eq!(unique_id("base", &taken), "base_3");
        assert_eq!(unique_id("other", &taken), "other");
    }

    #[test]
    fn test_kind_round_trip_and_field_map() {
        for kind in ProfileKind::ALL {
            assert_eq!(ProfileKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(ProfileKind::Policy.pipeline_field(), Some("line_policy"));
        assert_eq!(ProfileKind::Pipeline.pipeline_field(), None);
        let set = ProfileKindSet(ProfileKind::Api | ProfileKind::Chunk);
        assert_eq!(format!("{set}"), "api|chunk");
    }
}
