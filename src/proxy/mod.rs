//! Forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! RECEIVED
//!     → route gate (routing::matcher)        ─ reject → 404, not counted
//!     → target + header rewrite (upstream.rs, security::headers)
//!     → CONNECTING: send, bounded by the header timeout
//!         ─ timeout   → 504 envelope, counted
//!         ─ transport → 502 envelope, counted
//!     → HEADERS_RECEIVED: status + headers written immediately
//!     → STREAMING: relay.rs pumps the upstream body
//!         ─ upstream breaks → connection aborted, counted
//!     → DONE
//! ```
//!
//! # Design Decisions
//! - Bodies are never buffered whole in either direction
//! - Every forwarding attempt counts once as a request; at most one error per attempt
//! - A failure after headers cannot change the status, so the inbound
//!   connection is aborted instead of finishing a truncated response cleanly

pub mod error;
pub mod relay;
pub mod upstream;

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::server::AppState;
use crate::lifecycle::tasks::spawn_supervised;
use crate::observability::{ErrorKind, ProxyStats};
use crate::routing::RouteDecision;
use crate::security::headers::{inbound_response_headers, outbound_request_headers};

pub use error::{Envelope, ProxyError};
pub use relay::{relay, RelayEnd, RelayReport};
pub use upstream::{ClientInitError, UpstreamClient};

/// Entry point for every request not claimed by a status endpoint.
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    if state.matcher.decide(request.uri()) == RouteDecision::Reject {
        return not_found(state.matcher.prefix());
    }

    let start = Instant::now();
    let in_flight = state.in_flight.track();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    state.stats.record_request();

    let target = match state.upstream.target(&path) {
        Ok(target) => target,
        Err(e) => return fail(&state.stats, &method, &path, e),
    };

    let headers = outbound_request_headers(&parts.headers, state.upstream.host_header());
    let outbound_body = if has_body(&parts.headers) {
        let (stream, pump) = relay(body.into_data_stream(), |report| {
            if let RelayEnd::SourceFailed(error) = report.end {
                tracing::debug!(bytes = report.bytes, error = %error, "Inbound body ended early");
            }
        });
        spawn_supervised("request relay", Arc::clone(&state.stats), pump);
        Body::from_stream(stream)
    } else {
        Body::empty()
    };

    let upstream = match state.upstream.send(method.clone(), target, headers, outbound_body).await {
        Ok(response) => response,
        Err(e) => return fail(&state.stats, &method, &path, e),
    };

    let (head, upstream_body) = upstream.into_parts();
    let status = head.status;
    let elapsed = start.elapsed();
    state.stats.record_response(status.as_u16(), elapsed);
    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        upstream = %state.upstream.host(),
        "Forwarded"
    );

    let headers = inbound_response_headers(&head.headers);
    let stats = Arc::clone(&state.stats);
    let upstream_body = Body::new(upstream_body).into_data_stream();
    let (stream, pump) = relay(upstream_body, move |report| {
        // Held until the last byte is relayed so shutdown can see us.
        let _in_flight = in_flight;
        match report.end {
            RelayEnd::Complete => {}
            RelayEnd::SourceFailed(error) => {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    bytes = report.bytes,
                    error = %error,
                    "Upstream body failed after headers were sent, aborting response"
                );
                stats.record_error(ErrorKind::Truncated);
            }
            RelayEnd::ReceiverGone => {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    bytes = report.bytes,
                    "Client went away, upstream response dropped"
                );
            }
        }
    });
    spawn_supervised("response relay", Arc::clone(&state.stats), pump);

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn fail(stats: &ProxyStats, method: &axum::http::Method, path: &str, error: ProxyError) -> Response {
    tracing::error!(method = %method, path = %path, error = %error, "Proxy request failed");
    stats.record_error(error.kind());
    error.into_response()
}

/// Whether the inbound request carries a body to relay.
fn has_body(headers: &HeaderMap) -> bool {
    if headers.contains_key(TRANSFER_ENCODING) {
        return true;
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}

/// Local 404 for paths outside the forwarded prefix.
pub fn not_found(prefix: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        format!("Not Found - Only {} paths are proxied", prefix),
    )
        .into_response()
}
