use std::collections::HashMap;
use std::io::{BufRead, Read};

use tracing::{debug, info};

use super::error::ServerError;
use super::query::decode_path;
use super::route::Route;

/// Framing limits applied while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Request line plus headers, including line terminators
    pub max_header_bytes: usize,
    /// Largest accepted `Content-Length`
    pub max_body_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_header_bytes: 16 * 1024,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// One parsed HTTP request.
///
/// Built once per connection and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// `HTTP/1.0` or `HTTP/1.1`
    pub version: String,
    pub route: Route,
    /// Decoded query parameters
    pub params: HashMap<String, String>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Raw body, present only when `Content-Length` announced one
    pub body: Option<Vec<u8>>,
    pub content_length: Option<usize>,
}

impl ParsedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// The three parts of `METHOD SP TARGET SP HTTP/1.x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub target: &'a str,
    pub version: &'a str,
}

/// Parse a request line. Anything other than exactly three single-space
/// separated parts with an `HTTP/1.x` version is malformed.
pub fn parse_request_line(line: &str) -> Result<RequestLine<'_>, ServerError> {
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ServerError::malformed(format!("bad request line '{line}'")));
    };

    let method_ok = !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase());
    let version_ok = matches!(
        version.as_bytes(),
        [b'H', b'T', b'T', b'P', b'/', b'1', b'.', d] if d.is_ascii_digit()
    );
    if !method_ok || target.is_empty() || !version_ok {
        return Err(ServerError::malformed(format!("bad request line '{line}'")));
    }

    Ok(RequestLine {
        method,
        target,
        version,
    })
}

/// Read one line, charging its length against `budget`.
///
/// Returns `None` on a clean end of stream before any byte of the line.
fn read_line<R: BufRead>(reader: &mut R, budget: &mut usize) -> Result<Option<String>, ServerError> {
    let mut buf = Vec::new();
    let limit = (*budget as u64).saturating_add(1);
    let n = reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if n > *budget {
        return Err(ServerError::malformed("header section too large"));
    }
    *budget -= n;

    if buf.last() != Some(&b'\n') {
        return Err(ServerError::malformed("header section ended early"));
    }
    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| ServerError::malformed("header line is not UTF-8"))
}

/// Interim response for a client that sent `Expect: 100-continue`.
pub const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

/// Request line and headers, read before any body byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub version: String,
    pub route: Route,
    pub params: HashMap<String, String>,
    /// Lowercase keys
    pub headers: HashMap<String, String>,
    /// Already checked against `max_body_bytes`
    pub content_length: Option<usize>,
}

impl RequestHead {
    /// True when an HTTP/1.1 client is holding its body back until it sees
    /// [`CONTINUE_RESPONSE`].
    pub fn expects_continue(&self) -> bool {
        self.version == "HTTP/1.1"
            && self.content_length.is_some()
            && self
                .headers
                .get("expect")
                .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"))
    }
}

/// Read and parse one request: request line, headers up to the blank line,
/// then exactly `Content-Length` body bytes.
pub fn read_request<R: BufRead>(
    reader: &mut R,
    limits: &RequestLimits,
) -> Result<ParsedRequest, ServerError> {
    let head = read_head(reader, limits)?;
    read_body(reader, head)
}

/// Read the request line and headers and validate `Content-Length`.
pub fn read_head<R: BufRead>(
    reader: &mut R,
    limits: &RequestLimits,
) -> Result<RequestHead, ServerError> {
    let mut budget = limits.max_header_bytes;

    let line = read_line(reader, &mut budget)?.ok_or(ServerError::ConnectionClosed)?;
    let RequestLine {
        method,
        target,
        version,
    } = parse_request_line(&line)?;

    let decoded = decode_path(target).map_err(|e| ServerError::malformed(e.to_string()))?;

    let mut headers = HashMap::new();
    loop {
        let header = read_line(reader, &mut budget)?
            .ok_or_else(|| ServerError::malformed("header section ended early"))?;
        if header.is_empty() {
            break;
        }
        let Some((name, value)) = header.split_once(':') else {
            return Err(ServerError::malformed(format!("bad header line '{header}'")));
        };
        let name = name.trim();
        if name.is_empty() || name.contains(' ') {
            return Err(ServerError::malformed(format!("bad header name '{name}'")));
        }
        headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
    }

    debug!(
        header_count = headers.len(),
        header_names = ?headers.keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    if headers.contains_key("transfer-encoding") {
        return Err(ServerError::malformed("transfer-encoding is not supported"));
    }

    let content_length = match headers.get("content-length") {
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| ServerError::malformed(format!("bad content-length '{raw}'")))?,
        ),
        None => None,
    };
    if let Some(len) = content_length {
        if len > limits.max_body_bytes {
            return Err(ServerError::malformed(format!(
                "body of {len} bytes exceeds limit of {}",
                limits.max_body_bytes
            )));
        }
    }

    Ok(RequestHead {
        method: method.to_string(),
        path: decoded.path,
        version: version.to_string(),
        route: decoded.route,
        params: decoded.params,
        headers,
        content_length,
    })
}

/// Read the `Content-Length` body announced by `head`.
pub fn read_body<R: BufRead>(
    reader: &mut R,
    head: RequestHead,
) -> Result<ParsedRequest, ServerError> {
    let body = match head.content_length {
        Some(len) => {
            let mut body = vec![0u8; len];
            reader.read_exact(&mut body).map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => {
                    ServerError::malformed("body shorter than content-length")
                }
                _ => ServerError::Io(e),
            })?;
            info!(content_length = len, "Request body read");
            Some(body)
        }
        None => None,
    };

    info!(
        method = %head.method,
        path = %head.path,
        route = %head.route,
        http_version = %head.version,
        param_count = head.params.len(),
        "HTTP request parsed"
    );

    Ok(ParsedRequest {
        method: head.method,
        path: head.path,
        version: head.version,
        route: head.route,
        params: head.params,
        headers: head.headers,
        body,
        content_length: head.content_length,
    })
}
