//! # Command Line
//!
//! ```bash
//! docserve [SYNC_URL] [USERNAME] [PASSWORD] [--addr 0.0.0.0:8080]
//! ```
//!
//! The optional positional arguments name a replication peer. They are
//! captured and logged by presence only; replication itself is an external
//! collaborator and is not started by this binary.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::backend::MemoryStore;
use crate::config::ServerConfig;
use crate::logging::{init_logging_with_config, LogConfig};
use crate::server::{DocService, HttpServer, ServerHandle};

/// Document server for test automation
#[derive(Parser, Debug)]
#[command(name = "docserve", version, about, long_about = None)]
pub struct Cli {
    /// Replication peer URL
    pub sync_url: Option<String>,

    /// Replication user name
    pub username: Option<String>,

    /// Replication password
    pub password: Option<String>,

    /// Listen address
    #[arg(long, env = "DOCSERVE_ADDR")]
    pub addr: Option<String>,
}

/// Where replication would connect to. Credentials never show in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncTarget")
            .field("url", &self.url)
            .field("username", &self.username.as_ref().map(|_| "<REDACTED>"))
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl Cli {
    pub fn sync_target(&self) -> Option<SyncTarget> {
        self.sync_url
            .as_ref()
            .filter(|url| !url.is_empty())
            .map(|url| SyncTarget {
                url: url.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
            })
    }

    /// Environment configuration with command-line overrides applied.
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(addr) = &self.addr {
            config.addr = addr.clone();
        }
        config
    }
}

/// Parse arguments, start the server and block until SIGINT/SIGTERM.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;

    match cli.sync_target() {
        Some(target) => info!(
            url = %target.url,
            has_username = target.username.is_some(),
            has_password = target.password.is_some(),
            "sync target configured, replication is handled externally"
        ),
        None => info!("sync URL not provided, replication not started"),
    }

    let config = cli.server_config();
    let store = Arc::new(MemoryStore::with_limits(config.json_limits()));
    let service = DocService::from_backend(store);
    let handle = HttpServer::new(service, &config)
        .start(config.addr.as_str())
        .with_context(|| format!("failed to start server on {}", config.addr))?;

    info!(addr = %handle.local_addr(), "docserve listening");
    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    if handle.join().is_err() {
        tracing::warn!("Accept coroutine panicked");
    }
    Ok(())
}
