//! Per-connection lifecycle.
//!
//! Each accepted socket carries exactly one request:
//!
//! ```text
//! Accepted -> HeaderRead -> Routed -> BackendInvoked -> ResponseWritten -> Closed
//! ```
//!
//! A parse or routing failure writes a `400` and a backend failure writes a
//! `500`; either way the connection always ends in `Closed` and nothing
//! propagates to the accept loop.

use std::fmt;
use std::io::{BufReader, Read, Write};

use tracing::{debug, info, warn};

use super::error::ServerError;
use super::request::{read_body, read_head, RequestLimits, CONTINUE_RESPONSE};
use super::response::Response;
use super::service::{error_response, DocService};
use super::timing::RequestTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Accepted,
    HeaderRead,
    Routed,
    BackendInvoked,
    ResponseWritten,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Accepted => "accepted",
            ConnectionState::HeaderRead => "header_read",
            ConnectionState::Routed => "routed",
            ConnectionState::BackendInvoked => "backend_invoked",
            ConnectionState::ResponseWritten => "response_written",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// How far a connection got and what it answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    /// Last state reached before `Closed`
    pub reached: ConnectionState,
    /// Status written, `None` if nothing could be written
    pub status: Option<u16>,
}

struct Tracker {
    state: ConnectionState,
}

impl Tracker {
    fn advance(&mut self, next: ConnectionState) {
        debug!(from = %self.state, to = %next, "Connection state");
        self.state = next;
    }
}

/// Serve the single request carried by `stream`.
///
/// The `total` interval of `Server-Timing` starts once the request has been
/// read, so a slow client does not inflate it. The caller shuts the socket
/// down afterwards.
pub fn serve<S: Read + Write>(
    stream: &mut S,
    service: &DocService,
    limits: &RequestLimits,
) -> ConnectionOutcome {
    let mut tracker = Tracker {
        state: ConnectionState::Accepted,
    };
    let mut reader = BufReader::new(&mut *stream);

    let request = read_head(&mut reader, limits).and_then(|head| {
        if head.expects_continue() {
            debug!(content_length = ?head.content_length, "Sending 100 Continue");
            let out = reader.get_mut();
            out.write_all(CONTINUE_RESPONSE)?;
            out.flush()?;
        }
        read_body(&mut reader, head)
    });
    let mut timer = RequestTimer::start();

    let response = match request {
        Ok(req) => {
            tracker.advance(ConnectionState::HeaderRead);
            match service.route(&req) {
                Ok(action) => {
                    tracker.advance(ConnectionState::Routed);
                    let action_name = action.name();
                    let result = service.invoke(action, &mut timer);
                    tracker.advance(ConnectionState::BackendInvoked);
                    debug!(
                        action = action_name,
                        backend_ms = timer.backend().as_secs_f64() * 1000.0,
                        "Backend call completed"
                    );
                    result.map_err(|e| (e, timer))
                }
                Err(e) => Err((e, timer)),
            }
        }
        Err(e) => Err((e, timer)),
    };

    let response: Option<Response> = match response {
        Ok(res) => Some(res),
        Err((ServerError::ConnectionClosed, _)) => {
            debug!("Peer closed before sending a request");
            None
        }
        Err((e, timer)) => error_response(&e, &timer),
    };

    let status = match response {
        Some(res) => match res.write_to(reader.get_mut()) {
            Ok(()) => {
                tracker.advance(ConnectionState::ResponseWritten);
                info!(status = res.status, body_len = res.body().len(), "Response written");
                Some(res.status)
            }
            Err(e) => {
                warn!(error = %e, "Failed to write response");
                None
            }
        },
        None => None,
    };

    let reached = tracker.state;
    tracker.advance(ConnectionState::Closed);

    ConnectionOutcome { reached, status }
}
