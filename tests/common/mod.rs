#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Once};
use std::time::Duration;

use docserve::backend::MemoryStore;
use docserve::config::ServerConfig;
use docserve::server::{DocService, HttpServer, ServerHandle};

/// Ensures May coroutines are configured only once
static MAY_INIT: Once = Once::new();

pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x10_0000);
    });
}

/// Running server bound to an ephemeral port, stopped on drop.
pub struct TestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl TestServer {
    pub fn with_memory_store() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let server = Self::with_service(DocService::from_backend(Arc::clone(&store)));
        (server, store)
    }

    pub fn with_service(service: DocService) -> Self {
        Self::with_config(service, ServerConfig::default())
    }

    pub fn with_config(service: DocService, config: ServerConfig) -> Self {
        setup_may_runtime();
        let handle = HttpServer::new(service, &config)
            .start("127.0.0.1:0")
            .unwrap();
        handle.wait_ready().unwrap();
        let addr = handle.local_addr();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn send(&self, raw: &str) -> RawResponse {
        send_request(&self.addr, raw.as_bytes())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub status_line: String,
    /// In wire order, `Content-Length` included
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Write `raw` and read until the server closes the connection.
pub fn send_request(addr: &SocketAddr, raw: &[u8]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(raw).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            // The server may reset after answering a request it rejected
            // before reading all of it.
            Err(_) => break,
        }
    }
    parse_response(&String::from_utf8_lossy(&buf))
}

pub fn parse_response(resp: &str) -> RawResponse {
    let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap_or("").to_string();
    let status = status_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("0")
        .parse()
        .unwrap_or(0);
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();
    RawResponse {
        status,
        status_line,
        headers,
        body: body.to_string(),
    }
}
