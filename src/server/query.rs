//! # Query Decoder
//!
//! Turns a raw request target such as
//! `/set?id=abc123&json=%7B%22data%22:%22abcde12345%22%7D` into a route and a
//! map of decoded parameters.
//!
//! - The target splits on the first `?` only.
//! - Parameters split on `&`; each pair splits on its first `=` only, so
//!   decoded values may themselves contain `=`.
//! - Pairs without `=` are ignored. When a name repeats, the first
//!   occurrence wins.
//! - Names and values are form-decoded: `+` is a space, `%XX` a byte, and
//!   the resulting bytes are read as UTF-8 (invalid sequences become U+FFFD).

use std::collections::HashMap;
use std::fmt;

use super::route::Route;

/// Result of decoding a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath {
    /// Path without the query string
    pub path: String,
    pub route: Route,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The target does not start with `/`
    InvalidPath(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::InvalidPath(raw) => write!(f, "invalid path '{raw}'"),
        }
    }
}

impl std::error::Error for QueryError {}

/// Decode a request target into route and parameters.
pub fn decode_path(raw: &str) -> Result<DecodedPath, QueryError> {
    let Some(rest) = raw.strip_prefix('/') else {
        return Err(QueryError::InvalidPath(raw.to_string()));
    };

    let (path_part, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    let token_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let route = Route::from_token(&rest[..token_end]);

    Ok(DecodedPath {
        path: path_part.to_string(),
        route,
        params: query.map(parse_query).unwrap_or_default(),
    })
}

/// Parse `k1=v1&k2=v2` into a map.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        params
            .entry(form_decode(name))
            .or_insert_with(|| form_decode(value));
    }
    params
}

/// Decode one `application/x-www-form-urlencoded` component.
pub fn form_decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
