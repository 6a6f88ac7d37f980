//! # Request Engine
//!
//! A small HTTP/1.x front end over raw sockets: one request per
//! connection, four fixed routes, and three injected backend capabilities.
//!
//! ## Flow
//!
//! 1. [`HttpServer`] accepts a connection and spawns a coroutine for it
//! 2. [`request::read_head`] parses the request line and headers, then
//!    [`request::read_body`] reads the body (after `100 Continue` if asked)
//! 3. [`query::decode_path`] turns the target into a [`Route`] and parameters
//! 4. [`DocService`] maps the route to a backend call and builds the [`Response`]
//! 5. [`connection::serve`] writes the response, or a `400`/`500`, and closes
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docserve::backend::MemoryStore;
//! use docserve::config::ServerConfig;
//! use docserve::server::{DocService, HttpServer};
//!
//! let config = ServerConfig::from_env();
//! let service = DocService::from_backend(Arc::new(MemoryStore::new()));
//! let handle = HttpServer::new(service, &config).start(config.addr.as_str()).unwrap();
//! handle.wait_ready().unwrap();
//! ```

pub mod connection;
pub mod error;
pub mod http_server;
pub mod query;
pub mod request;
pub mod response;
pub mod route;
pub mod service;
pub mod timing;

pub use connection::{serve, ConnectionOutcome, ConnectionState};
pub use error::ServerError;
pub use http_server::{HttpServer, ServerHandle};
pub use query::{decode_path, DecodedPath, QueryError};
pub use request::{read_request, ParsedRequest, RequestHead, RequestLimits};
pub use response::Response;
pub use route::Route;
pub use service::{Action, DocService};
pub use timing::RequestTimer;
