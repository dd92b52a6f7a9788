//! Startup banner.

use std::net::SocketAddr;

use crate::config::ProxyConfig;

pub const SERVICE_NAME: &str = "WeChat Work API Proxy Service";

/// Log the effective configuration before binding.
pub fn log_banner(config: &ProxyConfig) {
    tracing::info!("========================================");
    tracing::info!("  {}", SERVICE_NAME);
    tracing::info!("========================================");
    tracing::info!(
        proxy_port = config.listener.port,
        target_host = %config.upstream.host,
        target_port = config.upstream.port,
        timeout_ms = config.upstream.timeout_ms,
        "Configuration loaded"
    );
}

/// Log where the relay is reachable once the listener is bound.
pub fn log_listening(addr: SocketAddr, config: &ProxyConfig) {
    tracing::info!(address = %addr, "Proxy server listening on http://{}", addr);
    tracing::info!(
        "Proxying {}* to {}:{}",
        config.upstream.path_prefix(),
        config.upstream.host,
        config.upstream.port
    );
    tracing::info!("Health: http://localhost:{}/health", addr.port());
    tracing::info!("Stats:  http://localhost:{}/stats", addr.port());
}
