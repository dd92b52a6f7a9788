//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the wait for upstream response headers
//! - Cancel the outbound attempt when the bound is hit
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the inner future closes its socket
//! - Timeout errors are distinct from the inner future's own errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

/// Result of racing a fallible future against a deadline.
#[derive(Debug, PartialEq, Eq)]
pub enum Deadline<E> {
    /// The deadline passed first; the inner future was dropped.
    Elapsed,
    /// The inner future finished first with an error.
    Failed(E),
}

/// A fixed deadline applied to each upstream attempt.
#[derive(Debug, Clone, Copy)]
pub struct HeaderTimeout {
    duration: Duration,
}

impl HeaderTimeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Run `fut` to completion or until the deadline passes.
    pub async fn run<F, T, E>(&self, fut: F) -> Result<T, Deadline<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Deadline::Failed(e)),
            Err(_) => Err(Deadline::Elapsed),
        }
    }
}
