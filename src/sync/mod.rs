//! # Sync Engine
//!
//! Keeps a form (the structured, editable view of a profile) and its serialized document in
//! step.
//!
//! - [`SyncEngine::from_document`] reads a form out of YAML/JSON text.
//! - [`SyncEngine::to_document`] writes the form's fields *over a copy of the last loaded raw
//!   mapping*, so keys the form does not model (newer or legacy fields) survive every save.
//! - Edits go through a trailing [`Debounce`]: [`SyncEngine::edit`] only schedules a
//!   serialization, [`SyncEngine::poll`] performs it once the delay has passed, and
//!   [`SyncEngine::flush`] performs it immediately (before a save or a profile switch).
//! - Free-text JSON fields (api headers and params, parser options) are resolved through a
//!   last-known-good cache: text that does not parse keeps the previous value in the document
//!   and raises one [`SyncNotice`] until the field parses again.
//! - The same [`FieldCache`] remembers the text typed for normalized fields (numbers, JSON
//!   objects), so reading the engine's own output back does not reformat what the user wrote.
//! - Loading over an edit that is still waiting on the debounce parks it for
//!   [`SyncEngine::take_discarded`] and logs a warning.
//! - [`Generation`] tokens let a caller drop the result of a load that was overtaken by a newer
//!   selection.

pub mod forms;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

pub use forms::{ApiForm, ChunkForm, ParserForm, PipelineForm, PolicyForm, PromptForm};

use crate::{
    config::SyncConfig,
    document::parse_mapping,
    error::GlossaError,
    properties::ProfileKind,
};

pub type Mapping = Map<String, JsonValue>;

/// A structured form over one profile kind.
pub trait FormModel: Clone + Default + PartialEq {
    const KIND: ProfileKind;

    /// Top-level keys whose value is edited as free JSON text.
    const JSON_FIELDS: &'static [&'static str] = &[];

    /// Read the form out of a document mapping. Missing keys give empty fields; `fields`
    /// supplies the typed text behind normalized values.
    fn from_mapping(map: &Mapping, fields: &FieldCache) -> Self;

    /// Write the form's fields into `map`. Cleared fields are removed; keys the form does not
    /// model are left alone.
    fn write_mapping(&self, map: &mut Mapping, fields: &mut FieldCache);
}

/// One-shot, non-blocking message raised while syncing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncNotice {
    pub field: String,
    pub message: String,
}

/// Per-engine memory of field values.
///
/// Holds the last successfully parsed value of every JSON text field, and the exact text that
/// produced each normalized value (numbers, JSON objects) so a form read back from its own
/// document shows what the user typed.
#[derive(Debug, Default)]
pub struct FieldCache {
    last_good: BTreeMap<String, JsonValue>,
    warned: BTreeSet<String>,
    notices: Vec<SyncNotice>,
    typed: BTreeMap<String, (String, JsonValue)>,
}

impl FieldCache {
    /// Write `text` for the JSON field `field` into `map`. Blank text clears the field. Text
    /// that does not parse as a JSON object keeps the last good value (or the current one if
    /// none is cached).
    pub fn put_json(&mut self, map: &mut Mapping, field: &str, text: &str) {
        if text.trim().is_empty() {
            self.last_good.remove(field);
            self.warned.remove(field);
            self.typed.remove(field);
            map.remove(field);
            return;
        }
        match serde_json::from_str::<JsonValue>(text) {
            Ok(value @ JsonValue::Object(_)) => {
                self.warned.remove(field);
                self.last_good.insert(field.to_string(), value.clone());
                self.remember(field, text, Some(&value));
                map.insert(field.to_string(), value);
            }
            Ok(_) => self.keep_last_good(map, field, "expected a JSON object".to_string()),
            Err(e) => self.keep_last_good(map, field, e.to_string()),
        }
    }

    fn keep_last_good(&mut self, map: &mut Mapping, field: &str, reason: String) {
        if let Some(value) = self.last_good.get(field) {
            map.insert(field.to_string(), value.clone());
        }
        if self.warned.insert(field.to_string()) {
            tracing::debug!("keeping last good value of '{field}': {reason}");
            self.notices.push(SyncNotice {
                field: field.to_string(),
                message: reason,
            });
        }
    }

    /// Record that `text` was written to `path` as `value`; `None` forgets the path.
    pub fn remember(&mut self, path: &str, text: &str, value: Option<&JsonValue>) {
        match value {
            Some(value) => {
                self.typed
                    .insert(path.to_string(), (text.to_string(), value.clone()));
            }
            None => {
                self.typed.remove(path);
            }
        }
    }

    /// Text last written to `path`, if the document still holds the value it produced.
    pub fn recall(&self, path: &str, current: Option<&JsonValue>) -> Option<&str> {
        self.typed
            .get(path)
            .filter(|(_, written)| current == Some(written))
            .map(|(text, _)| text.as_str())
    }

    fn seed(&mut self, map: &Mapping, fields: &[&str]) {
        self.last_good.clear();
        self.warned.clear();
        for field in fields {
            if let Some(value @ JsonValue::Object(_)) = map.get(*field) {
                self.last_good.insert(field.to_string(), value.clone());
            }
        }
    }

    fn forget_typed(&mut self) {
        self.typed.clear();
    }

    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        std::mem::take(&mut self.notices)
    }
}

/// Trailing debounce with an injected clock.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Debounce {
            delay,
            deadline: None,
        }
    }

    /// Record an event at `now`, pushing the deadline back.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True (once) when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// True (once) if anything was pending, regardless of the deadline.
    pub fn flush(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Request token handed out by [`Generation::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Monotonic request counter; only the latest token is current.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn next(&self) -> RequestToken {
        RequestToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }

    /// Most recently issued token (zero before the first).
    pub fn current(&self) -> RequestToken {
        RequestToken(self.current.load(Ordering::SeqCst))
    }
}

/// Two-way, debounced binding between a form and its document text.
#[derive(Debug)]
pub struct SyncEngine<F: FormModel> {
    raw: Mapping,
    form: F,
    text: String,
    debounce: Debounce,
    fields: FieldCache,
    loads: Generation,
    discarded: Option<String>,
}

impl<F: FormModel> SyncEngine<F> {
    pub fn new(config: &SyncConfig) -> Self {
        SyncEngine {
            raw: Mapping::new(),
            form: F::default(),
            text: String::new(),
            debounce: Debounce::new(config.debounce()),
            fields: FieldCache::default(),
            loads: Generation::default(),
            discarded: None,
        }
    }

    /// Read a form from document text. Fields whose stored value is still the one this engine
    /// last wrote come back as the text that was typed for them.
    pub fn from_document(&self, text: &str) -> Result<F, GlossaError> {
        Ok(F::from_mapping(&parse_mapping(text)?, &self.fields))
    }

    /// Replace the engine state with a freshly loaded document. An edit still waiting on the
    /// debounce is serialized and parked in [`take_discarded`](Self::take_discarded) instead
    /// of being applied; callers flush first if they want it saved.
    pub fn load(&mut self, text: &str) -> Result<&F, GlossaError> {
        let raw = parse_mapping(text)?;
        if self.debounce.is_pending() {
            self.park_pending();
        }
        if raw.get("id") != self.raw.get("id") {
            self.fields.forget_typed();
        }
        self.form = F::from_mapping(&raw, &self.fields);
        self.fields.seed(&raw, F::JSON_FIELDS);
        self.raw = raw;
        self.text = text.to_string();
        self.debounce.cancel();
        Ok(&self.form)
    }

    fn park_pending(&mut self) {
        let form = self.form.clone();
        match self.to_document(&form) {
            Ok(text) => {
                tracing::warn!(
                    "load {:?} replaced an unsaved {} edit; kept for take_discarded",
                    self.loads.current(),
                    F::KIND
                );
                self.discarded = Some(text);
            }
            Err(e) => {
                tracing::warn!(
                    "load {:?} dropped an unsaved {} edit that failed to serialize: {e}",
                    self.loads.current(),
                    F::KIND
                );
            }
        }
    }

    /// Document text of the last pending edit a load replaced.
    pub fn take_discarded(&mut self) -> Option<String> {
        self.discarded.take()
    }

    /// Start a load; pass the token to [`SyncEngine::finish_load`] with the loaded text.
    pub fn begin_load(&self) -> RequestToken {
        self.loads.next()
    }

    /// Apply a load if no newer one was started since. Returns `false` for a stale result.
    pub fn finish_load(&mut self, token: RequestToken, text: &str) -> Result<bool, GlossaError> {
        if !self.loads.is_current(token) {
            tracing::debug!("dropping stale {} load {:?}", F::KIND, token);
            return Ok(false);
        }
        self.load(text)?;
        Ok(true)
    }

    /// Serialize `form` merged over the last loaded raw document.
    pub fn to_document(&mut self, form: &F) -> Result<String, GlossaError> {
        let mut map = self.raw.clone();
        form.write_mapping(&mut map, &mut self.fields);
        Ok(serde_yaml::to_string(&JsonValue::Object(map))?)
    }

    /// Record an edit at `now`; serialization happens on [`poll`](Self::poll) or
    /// [`flush`](Self::flush).
    pub fn edit(&mut self, form: F, now: Instant) {
        self.form = form;
        self.debounce.touch(now);
    }

    /// Serialize if the debounce delay has passed since the last edit.
    pub fn poll(&mut self, now: Instant) -> Result<Option<&str>, GlossaError> {
        if self.debounce.poll(now) {
            self.serialize_form().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Serialize a pending edit right away.
    pub fn flush(&mut self) -> Result<Option<&str>, GlossaError> {
        if self.debounce.flush() {
            self.serialize_form().map(Some)
        } else {
            Ok(None)
        }
    }

    fn serialize_form(&mut self) -> Result<&str, GlossaError> {
        let form = self.form.clone();
        self.text = self.to_document(&form)?;
        Ok(&self.text)
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// Document text as last loaded or serialized.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        self.fields.take_notices()
    }
}
