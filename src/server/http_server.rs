use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use may::coroutine::JoinHandle;
use may::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::connection::serve;
use super::request::RequestLimits;
use super::service::DocService;
use crate::config::ServerConfig;

/// The listener plus everything a connection coroutine needs.
///
/// Accepts connections in one coroutine and serves each one in its own,
/// so a slow backend call only holds up the connection that made it.
pub struct HttpServer {
    service: DocService,
    limits: RequestLimits,
    stack_size: usize,
    read_timeout: Option<Duration>,
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it,
/// or joining the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to. Useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the listener does not answer within ~250ms
    /// (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept coroutine and wait for it to finish.
    ///
    /// Connections already accepted run to completion on their own.
    pub fn stop(self) {
        // SAFETY: cancel() is unsafe in the may runtime. The handle is owned
        // here and valid, and the coroutine only parks in accept(), which is
        // a cancellation point.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            debug!("Accept coroutine ended by cancellation");
        }
        info!(addr = %self.addr, "Server stopped");
    }

    /// Block until the accept coroutine finishes
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl HttpServer {
    pub fn new(service: DocService, config: &ServerConfig) -> Self {
        Self {
            service,
            limits: config.request_limits(),
            stack_size: config.stack_size,
            read_timeout: config.read_timeout,
        }
    }

    /// Bind `addr` and start accepting connections
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, the port cannot be bound,
    /// or the accept coroutine cannot be spawned.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        info!(
            addr = %addr,
            stack_size = self.stack_size,
            max_header_bytes = self.limits.max_header_bytes,
            max_body_bytes = self.limits.max_body_bytes,
            "Listener bound"
        );

        // SAFETY: Builder::spawn is unsafe in the may runtime because the
        // closure must not hold thread-local references. It owns the
        // listener and the server state outright.
        let handle = unsafe {
            may::coroutine::Builder::new()
                .name("docserve-accept".to_string())
                .stack_size(self.stack_size)
                .spawn(move || self.accept_loop(listener))?
        };

        Ok(ServerHandle { addr, handle })
    }

    fn accept_loop(self, listener: TcpListener) {
        let mut failures = 0u32;
        for incoming in listener.incoming() {
            let stream = match incoming {
                Ok(stream) => {
                    failures = 0;
                    stream
                }
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    warn!(error = %e, failures, delay_ms = delay.as_millis() as u64, "Accept failed");
                    may::coroutine::sleep(delay);
                    continue;
                }
            };
            let accepted = Instant::now();
            let peer = stream.peer_addr().ok();
            debug!(peer = ?peer, "Connection accepted");

            let service = self.service.clone();
            let limits = self.limits;
            let read_timeout = self.read_timeout;

            // SAFETY: same contract as the accept coroutine; the closure
            // owns the stream and a clone of the service.
            let spawned = unsafe {
                may::coroutine::Builder::new()
                    .stack_size(self.stack_size)
                    .spawn(move || {
                        let mut stream = stream;
                        if let Err(e) = stream.set_read_timeout(read_timeout) {
                            warn!(error = %e, "Failed to set read timeout");
                        }
                        let outcome = serve(&mut stream, &service, &limits);
                        if let Err(e) = stream.shutdown(Shutdown::Both) {
                            debug!(error = %e, "Socket shutdown failed");
                        }
                        debug!(
                            peer = ?peer,
                            reached = %outcome.reached,
                            status = ?outcome.status,
                            elapsed_ms = accepted.elapsed().as_secs_f64() * 1000.0,
                            "Connection closed"
                        );
                    })
            };

            if let Err(e) = spawned {
                error!(peer = ?peer, error = %e, "Failed to spawn connection coroutine");
            }
        }
    }
}

const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Pause before the next accept after `failures` consecutive errors:
/// doubling from 10 ms, capped at one second.
fn accept_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1u32 << shift)
        .min(ACCEPT_BACKOFF_MAX)
}
