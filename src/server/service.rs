//! # Document Service
//!
//! Maps a [`ParsedRequest`] onto one of the injected backend capabilities
//! and turns the outcome into a [`Response`]. Routing and invocation are
//! separate steps so the connection state machine can observe each one.
//!
//! | Route      | Methods     | Backend call                   |
//! |------------|-------------|--------------------------------|
//! | `/get`     | GET         | `Getter::get(id)`              |
//! | `/set`     | GET, POST   | `Setter::set(id, json)`        |
//! | `/results` | GET, POST   | `Results::get_results` / `set_results` |
//! | `/ping`    | any         | none                           |

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::error::ServerError;
use super::request::ParsedRequest;
use super::response::{Response, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
use super::route::Route;
use super::timing::RequestTimer;
use crate::backend::{BackendError, Getter, Results, Setter};

pub const CACHE_CONTROL: &str = "no-store, max-age=0";
pub const CONNECTION: &str = "keep-alive";

/// What a routed request asks the backend to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Get { id: String },
    Set { id: String, json: String },
    StoreResults { text: String },
    LoadResults,
    Ping,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Get { .. } => "get",
            Action::Set { .. } => "set",
            Action::StoreResults { .. } => "store_results",
            Action::LoadResults => "load_results",
            Action::Ping => "ping",
        }
    }
}

/// The request engine's view of storage: three capabilities, shared by
/// every connection.
#[derive(Clone)]
pub struct DocService {
    getter: Arc<dyn Getter>,
    setter: Arc<dyn Setter>,
    results: Arc<dyn Results>,
}

impl DocService {
    pub fn new(
        getter: Arc<dyn Getter>,
        setter: Arc<dyn Setter>,
        results: Arc<dyn Results>,
    ) -> Self {
        Self {
            getter,
            setter,
            results,
        }
    }

    /// Use one backend for all three capabilities.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: Getter + Setter + Results + 'static,
    {
        Self {
            getter: Arc::clone(&backend) as Arc<dyn Getter>,
            setter: Arc::clone(&backend) as Arc<dyn Setter>,
            results: backend,
        }
    }

    /// Decide which backend call a request maps to.
    ///
    /// A missing `id` is passed through as an empty string; the backend
    /// decides what that means.
    pub fn route(&self, req: &ParsedRequest) -> Result<Action, ServerError> {
        let method = req.method.as_str();
        let not_found = || ServerError::RouteNotFound {
            method: req.method.clone(),
            path: req.path.clone(),
        };
        let id = || req.param("id").unwrap_or_default().to_string();

        match (req.route, method) {
            (Route::Get, "GET") => Ok(Action::Get { id: id() }),
            (Route::Set, "GET") => Ok(Action::Set {
                id: id(),
                json: req.param("json").unwrap_or_default().to_string(),
            }),
            (Route::Set, "POST") => {
                let json = match req.param("json") {
                    Some(json) => json.to_string(),
                    None => body_text(req)?,
                };
                Ok(Action::Set { id: id(), json })
            }
            (Route::Results, "POST") => Ok(Action::StoreResults {
                text: body_text(req)?,
            }),
            (Route::Results, "GET") => Ok(Action::LoadResults),
            (Route::Ping, _) => Ok(Action::Ping),
            _ => Err(not_found()),
        }
    }

    /// Run `action` against the backend and build the success response.
    pub fn invoke(&self, action: Action, timer: &mut RequestTimer) -> Result<Response, ServerError> {
        let (content_type, body) = match action {
            Action::Get { id } => {
                let found = timer.time_backend(|| guarded(|| self.getter.get(&id)))?;
                debug!(id = %id, found = found.is_some(), "Document lookup");
                (Some(CONTENT_TYPE_JSON), found.unwrap_or_default())
            }
            Action::Set { id, json } => {
                timer.time_backend(|| guarded(|| self.setter.set(&id, &json)))?;
                debug!(id = %id, bytes = json.len(), "Document upserted");
                (Some(CONTENT_TYPE_JSON), String::new())
            }
            Action::StoreResults { text } => {
                timer.time_backend(|| guarded(|| self.results.set_results(&text)))?;
                (None, String::new())
            }
            Action::LoadResults => {
                let record = timer.time_backend(|| guarded(|| self.results.get_results()))?;
                (Some(CONTENT_TYPE_TEXT), record.unwrap_or_default())
            }
            Action::Ping => (None, String::new()),
        };

        Ok(build_response(200, content_type, timer).with_body(body))
    }

    /// Route and invoke in one step, turning failures into error responses.
    ///
    /// Returns `None` only when the failure leaves nothing to answer.
    pub fn handle(&self, req: &ParsedRequest, timer: &mut RequestTimer) -> Option<Response> {
        match self.route(req).and_then(|action| self.invoke(action, timer)) {
            Ok(res) => Some(res),
            Err(err) => error_response(&err, timer),
        }
    }
}

/// The body as text. Absent bodies read as empty.
fn body_text(req: &ParsedRequest) -> Result<String, ServerError> {
    match &req.body {
        Some(bytes) => String::from_utf8(bytes.clone())
            .map_err(|_| ServerError::malformed("request body is not UTF-8")),
        None => Ok(String::new()),
    }
}

/// Call into the backend, converting a panic into a backend failure.
fn guarded<T>(call: impl FnOnce() -> Result<T, BackendError>) -> Result<T, BackendError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(panic = %msg, "Backend capability panicked");
            Err(BackendError::Panicked(msg))
        }
    }
}

/// Response skeleton with the common headers in wire order. The caller
/// adds the body; `Content-Length` is written by [`Response::write_to`].
pub fn build_response(status: u16, content_type: Option<&str>, timer: &RequestTimer) -> Response {
    let mut res = Response::new(status).with_header("Cache-Control", CACHE_CONTROL);
    if let Some(content_type) = content_type {
        res.set_header("Content-Type", content_type);
    }
    res.with_header("Connection", CONNECTION)
        .with_header("Server-Timing", timer.header_value())
}

/// Empty-bodied error response for `err`, logging the diagnostic.
pub fn error_response(err: &ServerError, timer: &RequestTimer) -> Option<Response> {
    let status = err.status_code()?;
    if status >= 500 {
        error!(status, error = %err, "Request failed");
    } else {
        warn!(status, error = %err, "Request rejected");
    }
    Some(build_response(status, None, timer))
}
