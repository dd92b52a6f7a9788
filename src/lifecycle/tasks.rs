//! Detached task supervision.

use std::future::Future;
use std::sync::Arc;

use crate::observability::{ErrorKind, ProxyStats};

/// Spawn `fut` and watch it; a panic is logged and counted as an error
/// instead of vanishing with the task.
pub fn spawn_supervised<F>(task: &'static str, stats: Arc<ProxyStats>, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::spawn(fut);
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            if e.is_panic() {
                tracing::error!(task, error = %e, "Background task panicked");
                stats.record_error(ErrorKind::Panic);
            }
        }
    });
}
