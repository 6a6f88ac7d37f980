use std::time::{Duration, Instant};

/// Measures one request for the `Server-Timing` header.
///
/// `total` runs from the moment the request has been read until the header
/// is rendered; `db` covers only time spent inside backend calls.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimer {
    started: Instant,
    backend: Duration,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            backend: Duration::ZERO,
        }
    }

    /// Run `f`, adding its wall time to the backend interval.
    pub fn time_backend<T>(&mut self, f: impl FnOnce() -> T) -> T {
        let begin = Instant::now();
        let out = f();
        self.backend += begin.elapsed();
        out
    }

    pub fn backend(&self) -> Duration {
        self.backend
    }

    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    /// `total;dur=<ms>, db;dur=<ms>` with fractional milliseconds.
    pub fn header_value(&self) -> String {
        format_server_timing(self.total(), self.backend)
    }
}

pub fn format_server_timing(total: Duration, backend: Duration) -> String {
    format!(
        "total;dur={}, db;dur={}",
        total.as_secs_f64() * 1000.0,
        backend.as_secs_f64() * 1000.0
    )
}
