//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: status endpoints plus the forwarding fallback
//! - Wire up middleware (tracing, CORS headers, panic catching, preflight)
//! - Serve on a listener and drain gracefully on shutdown

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ProxyConfig;
use crate::http::request::make_request_span;
use crate::http::response::{preflight, PanicResponder};
use crate::net::InFlightTracker;
use crate::observability::ProxyStats;
use crate::proxy::{self, ClientInitError, UpstreamClient};
use crate::routing::PathPrefixMatcher;
use crate::security::headers::cors_headers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub stats: Arc<ProxyStats>,
    pub upstream: Arc<UpstreamClient>,
    pub matcher: Arc<PathPrefixMatcher>,
    pub in_flight: InFlightTracker,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    in_flight: InFlightTracker,
}

impl HttpServer {
    /// Create a new HTTP server. `stats` is shared so callers can read it.
    pub fn new(config: ProxyConfig, stats: Arc<ProxyStats>) -> Result<Self, ClientInitError> {
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);
        let matcher = Arc::new(PathPrefixMatcher::new(config.upstream.path_prefix()));
        let in_flight = InFlightTracker::new();

        let state = AppState {
            config: Arc::new(config.clone()),
            stats: Arc::clone(&stats),
            upstream,
            matcher,
            in_flight: in_flight.clone(),
        };

        let router = Self::build_router(state, stats);
        Ok(Self {
            router,
            config,
            in_flight,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run top to bottom: trace → CORS → panic catch → preflight → routes.
    fn build_router(state: AppState, stats: Arc<ProxyStats>) -> Router {
        let [origin, methods, headers] = cors_headers();

        let layers = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
            .layer(SetResponseHeaderLayer::if_not_present(origin.0, origin.1))
            .layer(SetResponseHeaderLayer::if_not_present(methods.0, methods.1))
            .layer(SetResponseHeaderLayer::if_not_present(headers.0, headers.1))
            .layer(CatchPanicLayer::custom(PanicResponder::new(stats)))
            .layer(middleware::from_fn(preflight));

        Router::new()
            .merge(setup_admin_router())
            .fallback(proxy::forward)
            .with_state(state)
            .layer(layers)
    }

    /// Run the server until `shutdown` fires, then drain.
    ///
    /// Draining stops accepting immediately and waits for open connections
    /// and in-flight relays up to the configured grace period; whatever is
    /// left is dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut drain_started = shutdown.resubscribe();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            res = &mut serve => {
                res?;
                tracing::info!("HTTP server stopped");
                return Ok(());
            }
            _ = drain_started.recv() => {}
        }

        let grace = Duration::from_secs(self.config.shutdown.grace_secs);
        tracing::info!(
            in_flight = self.in_flight.active_count(),
            grace_secs = grace.as_secs(),
            "Stopped accepting connections, draining"
        );

        // Connections close first; detached body pumps may still be finishing.
        let in_flight = self.in_flight.clone();
        let drained = async move {
            serve.await?;
            in_flight.wait_idle().await;
            Ok::<(), std::io::Error>(())
        };

        match tokio::time::timeout(grace, drained).await {
            Ok(res) => res?,
            Err(_) => tracing::warn!(
                in_flight = self.in_flight.active_count(),
                "Grace period elapsed, abandoning in-flight requests"
            ),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
