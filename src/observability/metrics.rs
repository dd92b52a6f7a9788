//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the process-lifetime request/error counters read by `/health` and `/stats`
//! - Mirror them into the `metrics` facade for Prometheus scraping
//!
//! # Metrics
//! - `relay_requests_total` (counter): forwarding attempts by upstream status
//! - `relay_errors_total` (counter): failures by kind
//! - `relay_upstream_header_seconds` (histogram): time to upstream response headers
//!
//! # Design Decisions
//! - The atomics in [`ProxyStats`] are the source of truth; the facade is best effort
//! - One shared `ProxyStats` is created at startup and injected into handlers

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;

/// Failure classes recorded in `relay_errors_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Upstream,
    Truncated,
    Panic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Truncated => "truncated",
            ErrorKind::Panic => "panic",
        }
    }
}

/// Process-wide request and error counters.
#[derive(Debug)]
pub struct ProxyStats {
    requests: AtomicU64,
    errors: AtomicU64,
    started: Instant,
}

impl ProxyStats {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one forwarding attempt.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one observed error.
    pub fn record_error(&self, kind: ErrorKind) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("relay_errors_total", "kind" => kind.as_str()).increment(1);
    }

    /// Record upstream response headers arriving.
    pub fn record_response(&self, status: u16, elapsed: Duration) {
        metrics::counter!("relay_requests_total", "status" => status.to_string()).increment(1);
        metrics::histogram!("relay_upstream_header_seconds").record(elapsed.as_secs_f64());
    }

    pub fn total_requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Time since the counters were created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for ProxyStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the Prometheus scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
