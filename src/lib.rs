//! # docserve
//!
//! **docserve** is a small HTTP front end that lets test automation drive a
//! document store over plain sockets. Clients issue requests such as
//!
//! ```text
//! GET /set?id=abc123&json=%7B%22data%22:%22abcde12345%22%7D HTTP/1.1
//! GET /get?id=abc123 HTTP/1.1
//! POST /results HTTP/1.1
//! GET /ping HTTP/1.1
//! ```
//!
//! and the server runs a lookup or upsert against a pluggable backend and
//! answers with JSON.
//!
//! ## Architecture
//!
//! - **[`json`]** - non-recursive JSON codec between wire text and [`json::JsonValue`]
//! - **[`server`]** - request parsing, query decoding, routing, response framing
//!   and the per-connection lifecycle on top of `may` coroutines
//! - **[`backend`]** - the `Getter`/`Setter`/`Results` capabilities and the
//!   in-memory reference store
//! - **[`config`]** - `DOCSERVE_*` environment configuration
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - the `docserve` binary's argument handling
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docserve::backend::MemoryStore;
//! use docserve::config::ServerConfig;
//! use docserve::server::{DocService, HttpServer};
//!
//! let config = ServerConfig::default();
//! let service = DocService::from_backend(Arc::new(MemoryStore::new()));
//! let handle = HttpServer::new(service, &config).start("127.0.0.1:8080").unwrap();
//! handle.join().unwrap();
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod json;
pub mod logging;
pub mod server;

pub use backend::{BackendError, Getter, MemoryStore, Results, Setter};
pub use json::{JsonError, JsonValue};
pub use server::{DocService, HttpServer, ServerHandle};
