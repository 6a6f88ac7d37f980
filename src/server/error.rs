use std::fmt;
use std::io;

use crate::backend::BackendError;

/// Everything that can go wrong while serving one connection.
///
/// Parsing and routing failures answer `400`, backend failures answer `500`.
/// Neither ever reaches the accept loop.
#[derive(Debug)]
pub enum ServerError {
    /// Bad request line, header, body framing or path
    MalformedRequest(String),
    /// Path outside the four known routes, or a method the route refuses
    RouteNotFound { method: String, path: String },
    /// A backend capability failed or panicked
    BackendFailure(BackendError),
    /// The peer closed the connection before sending a request line
    ConnectionClosed,
    /// Socket error while reading or writing
    Io(io::Error),
}

impl ServerError {
    /// Status code sent for this failure, `None` when no response can be
    /// written at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServerError::MalformedRequest(_) | ServerError::RouteNotFound { .. } => Some(400),
            ServerError::BackendFailure(_) => Some(500),
            ServerError::Io(e) if e.kind() == io::ErrorKind::TimedOut
                || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Some(400)
            }
            ServerError::Io(_) | ServerError::ConnectionClosed => None,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        ServerError::MalformedRequest(msg.into())
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::MalformedRequest(msg) => write!(f, "malformed request: {msg}"),
            ServerError::RouteNotFound { method, path } => {
                write!(f, "no route for {method} {path}")
            }
            ServerError::BackendFailure(e) => write!(f, "backend failure: {e}"),
            ServerError::ConnectionClosed => write!(f, "connection closed before request"),
            ServerError::Io(e) => write!(f, "socket error: {e}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::BackendFailure(e) => Some(e),
            ServerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        ServerError::Io(e)
    }
}

impl From<BackendError> for ServerError {
    fn from(e: BackendError) -> Self {
        ServerError::BackendFailure(e)
    }
}
