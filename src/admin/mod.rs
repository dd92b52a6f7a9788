//! Status endpoints: `/health`, `/stats` and the `/` help page.
//!
//! They read the counters and never change them. Matching is on the full
//! request target for any method: `/health?x=1` is not `/health` and gets
//! the same 404 as any other path outside the forwarded prefix.

pub mod handlers;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::any;
use axum::Router;

use crate::config::FORWARD_PREFIX;
use crate::http::server::AppState;
use crate::proxy::not_found;
use self::handlers::*;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/health", any(get_health))
        .route("/stats", any(get_stats))
        .route("/", any(get_help))
        .route_layer(middleware::from_fn(exact_target))
}

/// Only a bare path reaches a status handler.
async fn exact_target(request: Request, next: Next) -> Response {
    if request.uri().query().is_some() {
        return not_found(FORWARD_PREFIX);
    }
    next.run(request).await
}
