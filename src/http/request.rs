//! Request correlation.
//!
//! Each inbound request gets a UUID v4 that lives only in the log span.
//! It is never forwarded upstream and never added to responses.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use tracing::Span;
use uuid::Uuid;

/// Unique identifier for an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Span factory for `TraceLayer::make_span_with`.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "request",
        request_id = %RequestId::new(),
        method = %request.method(),
        uri = %request.uri(),
        peer = %peer,
    )
}
