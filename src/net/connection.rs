//! In-flight request tracking.
//!
//! # Responsibilities
//! - Count forwarded requests that are still running (headers or body)
//! - Give graceful shutdown something to report and wait on

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Global counter for request ids in log lines.
/// Relaxed ordering is enough: only uniqueness matters.
static IN_FLIGHT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InFlightId(u64);

impl InFlightId {
    pub fn new() -> Self {
        Self(IN_FLIGHT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for InFlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InFlightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fwd-{}", self.0)
    }
}

/// Tracks forwarded requests that have not finished relaying.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. The guard decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
            id: InFlightId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until nothing is in flight.
    pub async fn wait_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard held for the lifetime of one forwarded request.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
    id: InFlightId,
}

impl InFlightGuard {
    pub fn id(&self) -> InFlightId {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(request = %self.id, "Forwarded request finished");
    }
}
