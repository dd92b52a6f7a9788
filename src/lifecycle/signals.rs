//! OS signal handling.
//!
//! SIGTERM and SIGINT both mean "drain and exit". There is no reload signal.

/// Wait for the first termination signal and return its name.
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler, using Ctrl+C only");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        _ = term.recv() => "SIGTERM",
        name = ctrl_c() => name,
    }
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        // Without a signal source the process runs until killed.
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
