//! Response helpers shared by every route.
//!
//! # Responsibilities
//! - Answer CORS preflight for any path
//! - Turn a handler panic into an envelope response
//! - Pretty-printed JSON bodies for the status endpoints

use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tower_http::catch_panic::ResponseForPanic;

use crate::observability::{ErrorKind, ProxyStats};
use crate::proxy::Envelope;

/// OPTIONS on any path: 204, no body. CORS headers are added by the outer layer.
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

/// Serialize `value` with two-space indentation.
pub fn pretty_json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"))],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            Envelope::new("Internal proxy error").into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Converts a handler panic into a 500 envelope and counts it.
#[derive(Debug, Clone)]
pub struct PanicResponder {
    stats: Arc<ProxyStats>,
}

impl PanicResponder {
    pub fn new(stats: Arc<ProxyStats>) -> Self {
        Self { stats }
    }
}

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let message = if let Some(s) = err.downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s
        } else {
            "unknown panic"
        };
        tracing::error!(panic = %message, "Request handler panicked");
        self.stats.record_error(ErrorKind::Panic);

        Envelope::new("Internal proxy error").into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
