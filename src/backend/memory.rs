//! In-memory reference backend.
//!
//! Documents are validated with the JSON codec and kept as value trees in a
//! sharded concurrent map, so `get` re-encodes what `set` decoded. The
//! results slot is an `ArcSwapOption`: readers never block and the last
//! writer wins.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{SecondsFormat, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::{BackendError, Getter, Results, ResultsRecord, Setter, DEFAULT_COPYRIGHT, RESULTS_ID};
use crate::json::{self, JsonValue, Limits};

pub struct MemoryStore {
    documents: DashMap<String, JsonValue>,
    results: ArcSwapOption<ResultsRecord>,
    limits: Limits,
    copyright: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Use custom decode limits for incoming documents.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            documents: DashMap::new(),
            results: ArcSwapOption::empty(),
            limits,
            copyright: DEFAULT_COPYRIGHT.to_string(),
        }
    }

    /// Replace the attribution line stamped on results records.
    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The raw results record, if one is stored.
    pub fn results_record(&self) -> Option<Arc<ResultsRecord>> {
        self.results.load_full()
    }
}

impl Getter for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<String>, BackendError> {
        let Some(doc) = self.documents.get(id) else {
            return Ok(None);
        };
        let text = json::encode(doc.value())?;
        Ok(Some(text))
    }
}

impl Setter for MemoryStore {
    fn set(&self, id: &str, document: &str) -> Result<(), BackendError> {
        if id.is_empty() {
            return Err(BackendError::InvalidId(id.to_string()));
        }
        let value = json::decode_with_limits(document, self.limits)?;
        debug!(id = %id, kind = value.type_name(), "Document stored");
        self.documents.insert(id.to_string(), value);
        Ok(())
    }
}

impl Results for MemoryStore {
    fn set_results(&self, text: &str) -> Result<(), BackendError> {
        let record = ResultsRecord {
            id: RESULTS_ID.to_string(),
            copyright: self.copyright.clone(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            results: text.to_string(),
        };
        debug!(id = %record.id, bytes = text.len(), "Results record replaced");
        self.results.store(Some(Arc::new(record)));
        Ok(())
    }

    fn get_results(&self) -> Result<Option<String>, BackendError> {
        Ok(self.results.load_full().map(|record| record.render()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_round_trips() {
        let store = MemoryStore::new();
        store.set("abc123", r#"{"data":"abcde12345"}"#).unwrap();
        let text = store.get("abc123").unwrap().unwrap();
        assert_eq!(
            json::decode(&text).unwrap(),
            json::decode(r#"{"data":"abcde12345"}"#).unwrap()
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_and_empty_ids() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").unwrap(), None);
        assert_eq!(store.get("").unwrap(), None);
        assert!(matches!(
            store.set("", "{}"),
            Err(BackendError::InvalidId(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_json_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set("a", "{\"x\":"),
            Err(BackendError::InvalidJson(_))
        ));
        assert!(matches!(store.set("a", ""), Err(BackendError::InvalidJson(_))));
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_upsert_replaces() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "[true]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[true]"));
    }

    #[test]
    fn test_depth_limit_applies() {
        let store = MemoryStore::with_limits(Limits::with_max_depth(3));
        assert!(store.set("ok", "[[[]]]").is_ok());
        assert!(matches!(
            store.set("deep", "[[[[]]]]"),
            Err(BackendError::InvalidJson(json::JsonError::DepthLimitExceeded { limit: 3 }))
        ));
    }

    #[test]
    fn test_results_slot_last_writer_wins() {
        let store = MemoryStore::new().with_copyright("(c) tests");
        assert_eq!(store.get_results().unwrap(), None);

        store.set_results("first").unwrap();
        store.set_results("42 passed, 0 failed").unwrap();

        let rendered = store.get_results().unwrap().unwrap();
        let lines: Vec<&str> = rendered.split('\n').collect();
        assert_eq!(lines[0], "(c) tests");
        assert!(chrono::DateTime::parse_from_rfc3339(lines[1]).is_ok());
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "42 passed, 0 failed");

        let record = store.results_record().unwrap();
        assert_eq!(record.id, RESULTS_ID);
        assert_eq!(record.results, "42 passed, 0 failed");
    }
}
