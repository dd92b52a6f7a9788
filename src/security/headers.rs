//! Header manipulation.
//!
//! # Responsibilities
//! - Force `Host` to the upstream and `Connection: close` on outbound requests
//! - Drop proxy-chain headers instead of forwarding them
//! - Strip `Transfer-Encoding` from upstream responses
//! - Permissive CORS headers for every inbound response
//!
//! # Design Decisions
//! - Everything else passes through untouched, repeated headers included
//! - X-Forwarded-* is never synthesized; upstream sees the relay as the client

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONNECTION, HOST, TRANSFER_ENCODING,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Proxy-chain headers that are never copied upstream.
const PROXY_CHAIN_HEADERS: [&str; 2] = ["x-forwarded-for", "x-forwarded-proto"];

/// Build the outbound header set from the inbound one.
pub fn outbound_request_headers(inbound: &HeaderMap, upstream_host: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 2);

    for (name, value) in inbound {
        if *name == HOST || *name == CONNECTION || PROXY_CHAIN_HEADERS.contains(&name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(HOST, upstream_host.clone());
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    headers
}

/// Copy upstream response headers for the inbound response.
///
/// `Transfer-Encoding` is left to the inbound connection's own framing.
pub fn inbound_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    headers.remove(TRANSFER_ENCODING);
    headers
}

/// CORS headers set on every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        (
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        ),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ),
    ]
}
