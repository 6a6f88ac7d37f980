//! # Server Configuration
//!
//! Everything tunable is read once at startup from `DOCSERVE_*` environment
//! variables. Unset or unparsable values fall back to the defaults below.
//!
//! | Variable                    | Default        | Meaning                              |
//! |-----------------------------|----------------|--------------------------------------|
//! | `DOCSERVE_ADDR`             | `0.0.0.0:8080` | listen address                       |
//! | `DOCSERVE_STACK_SIZE`       | `0x100000`     | connection coroutine stack, dec/hex  |
//! | `DOCSERVE_MAX_HEADER_BYTES` | `16384`        | request line + headers               |
//! | `DOCSERVE_MAX_BODY_BYTES`   | `8388608`      | largest `Content-Length`             |
//! | `DOCSERVE_JSON_MAX_DEPTH`   | `1000`         | nesting limit for stored documents   |
//! | `DOCSERVE_READ_TIMEOUT_MS`  | `5000`         | socket read timeout, `0` disables    |
//!
//! Stored documents are value trees and dropping one walks it recursively,
//! so the stack must cover `DOCSERVE_JSON_MAX_DEPTH` levels of drop glue.
//!
//! ```bash
//! export DOCSERVE_STACK_SIZE=0x200000
//! export DOCSERVE_JSON_MAX_DEPTH=2000
//! docserve
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::json::Limits;
use crate::server::RequestLimits;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_STACK_SIZE: usize = 0x10_0000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    /// Stack size for accept and connection coroutines in bytes
    pub stack_size: usize,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
    pub json_max_depth: usize,
    /// `None` waits forever
    pub read_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let limits = RequestLimits::default();
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            max_header_bytes: limits.max_header_bytes,
            max_body_bytes: limits.max_body_bytes,
            json_max_depth: crate::json::limits::DEFAULT_MAX_DEPTH,
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let read_timeout = match lookup("DOCSERVE_READ_TIMEOUT_MS").and_then(|v| parse_num::<u64>(&v)) {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.read_timeout,
        };

        Self {
            addr: lookup("DOCSERVE_ADDR")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.addr),
            stack_size: lookup("DOCSERVE_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.stack_size),
            max_header_bytes: lookup("DOCSERVE_MAX_HEADER_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.max_header_bytes),
            max_body_bytes: lookup("DOCSERVE_MAX_BODY_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.max_body_bytes),
            json_max_depth: lookup("DOCSERVE_JSON_MAX_DEPTH")
                .and_then(|v| parse_num::<usize>(&v))
                .filter(|depth| *depth > 0)
                .unwrap_or(defaults.json_max_depth),
            read_timeout,
        }
    }

    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn json_limits(&self) -> Limits {
        Limits::with_max_depth(self.json_max_depth)
    }
}

fn parse_num<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

/// Decimal or `0x`-prefixed hexadecimal byte count.
fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr, "0.0.0.0:8080");
        assert_eq!(config.stack_size, 0x10_0000);
        assert_eq!(config.json_limits().max_depth, 1000);
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("DOCSERVE_ADDR", "127.0.0.1:9000"),
            ("DOCSERVE_STACK_SIZE", "0x8000"),
            ("DOCSERVE_MAX_HEADER_BYTES", "4096"),
            ("DOCSERVE_MAX_BODY_BYTES", "1024"),
            ("DOCSERVE_JSON_MAX_DEPTH", "64"),
            ("DOCSERVE_READ_TIMEOUT_MS", "0"),
        ]);
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.stack_size, 0x8000);
        assert_eq!(
            config.request_limits(),
            RequestLimits {
                max_header_bytes: 4096,
                max_body_bytes: 1024
            }
        );
        assert_eq!(config.json_max_depth, 64);
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn test_garbage_falls_back() {
        let config = from_pairs(&[
            ("DOCSERVE_STACK_SIZE", "0xzz"),
            ("DOCSERVE_JSON_MAX_DEPTH", "0"),
            ("DOCSERVE_READ_TIMEOUT_MS", "soon"),
            ("DOCSERVE_ADDR", "  "),
        ]);
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16384"), Some(16384));
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("0X10"), Some(16));
        assert_eq!(parse_size("-1"), None);
    }
}
