//! CGI relay (v1)
//!
//! Accepts HTTP on a local port and forwards `/cgi-bin/*` to a single
//! upstream, for clients that cannot reach the upstream directly.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ listener ──▶ axum router ─┬─▶ /health /stats /  (admin)
//!                                          ├─▶ OPTIONS → 204
//!                                          └─▶ forward ──▶ upstream client ──▶ Upstream
//!                                                 ▲                │
//!     Client ◀──────── relay (bounded) ◀──────────┴────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cgi_relay::config::load_config;
use cgi_relay::lifecycle::{signals, startup, Shutdown};
use cgi_relay::net::listener;
use cgi_relay::observability::{logging, metrics, ProxyStats};
use cgi_relay::HttpServer;

#[derive(Parser)]
#[command(name = "cgi-relay")]
#[command(version, about = "Relay /cgi-bin/ requests to a fixed upstream API host", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables still take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port. Overrides PROXY_PORT.
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(config.observability.log_format);
    startup::log_banner(&config);

    if let Some(addr) = &config.observability.metrics_address {
        // Already validated by the loader.
        if let Ok(addr) = addr.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = listener::bind(&config.listener).await?;
    startup::log_listening(listener.local_addr()?, &config);

    let stats = Arc::new(ProxyStats::new());
    let server = HttpServer::new(config, stats)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let signal = signals::wait_for_signal().await;
        tracing::info!(signal, "Received signal, shutting down gracefully");
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Server closed");
    Ok(())
}
