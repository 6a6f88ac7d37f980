//! # Backend Capabilities
//!
//! The request engine never talks to storage directly. It is handed three
//! narrow capabilities at construction time and calls them from connection
//! coroutines:
//!
//! - [`Getter`] - look a document up by id
//! - [`Setter`] - upsert a document by id
//! - [`Results`] - read/write the single results slot
//!
//! Implementations must be `Send + Sync`: every accepted connection runs in
//! its own coroutine and may call into the backend concurrently. Any storage
//! engine that satisfies the contracts below is acceptable;
//! [`memory::MemoryStore`] is the in-process reference implementation.

pub mod memory;

use std::fmt;

use crate::json::JsonError;

pub use memory::MemoryStore;

/// Attribution line stamped on every stored results record.
pub const DEFAULT_COPYRIGHT: &str = "Copyright (c) docserve contributors";

/// Id every results record is stored under.
pub const RESULTS_ID: &str = "results";

/// Errors a backend capability can report.
///
/// All of them surface to clients as `500 Internal Server Error` with an
/// empty body; the detail is only logged.
#[derive(Debug)]
pub enum BackendError {
    /// The id is not acceptable to the store (e.g. empty)
    InvalidId(String),
    /// The document text is not valid JSON
    InvalidJson(JsonError),
    /// The store itself failed
    Storage(String),
    /// The capability panicked; the engine caught it
    Panicked(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::InvalidId(id) => write!(f, "invalid document id '{id}'"),
            BackendError::InvalidJson(e) => write!(f, "invalid document: {e}"),
            BackendError::Storage(msg) => write!(f, "storage failure: {msg}"),
            BackendError::Panicked(msg) => write!(f, "backend panicked: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JsonError> for BackendError {
    fn from(e: JsonError) -> Self {
        BackendError::InvalidJson(e)
    }
}

/// Look up a document by id.
pub trait Getter: Send + Sync {
    /// Return the document as JSON text, or `None` if there is none.
    ///
    /// An empty id is a valid call; implementations usually answer `None`.
    fn get(&self, id: &str) -> Result<Option<String>, BackendError>;
}

/// Insert or replace a document by id.
pub trait Setter: Send + Sync {
    /// Store `json` under `id`. Fails if the text is not valid JSON or the
    /// id is unacceptable to the store.
    fn set(&self, id: &str, json: &str) -> Result<(), BackendError>;
}

/// The single results slot.
pub trait Results: Send + Sync {
    /// Store `text` as the one results record, replacing any previous one
    /// and stamping it with the current date and an attribution line.
    fn set_results(&self, text: &str) -> Result<(), BackendError>;

    /// Read the stored record back, already rendered by
    /// [`ResultsRecord::render`].
    fn get_results(&self) -> Result<Option<String>, BackendError>;
}

/// One stored results record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsRecord {
    /// Always [`RESULTS_ID`]
    pub id: String,
    pub copyright: String,
    /// Wall-clock date the record was stored, RFC 3339
    pub date: String,
    pub results: String,
}

impl ResultsRecord {
    /// `copyright\ndate\n\nresults`
    pub fn render(&self) -> String {
        format!("{}\n{}\n\n{}", self.copyright, self.date, self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        let record = ResultsRecord {
            id: RESULTS_ID.to_string(),
            copyright: "(c) me".to_string(),
            date: "2024-01-01T00:00:00Z".to_string(),
            results: "42 passed, 0 failed".to_string(),
        };
        assert_eq!(
            record.render(),
            "(c) me\n2024-01-01T00:00:00Z\n\n42 passed, 0 failed"
        );
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::from(JsonError::EmptyInput);
        assert!(err.to_string().starts_with("invalid document"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(
            BackendError::InvalidId(String::new()).to_string(),
            "invalid document id ''"
        );
    }
}
