//! Forwarding errors and the JSON error envelope.

use std::error::Error as StdError;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::observability::ErrorKind;

/// Error code carried by every envelope.
pub const ENVELOPE_ERRCODE: i32 = -1;

/// The `{errcode, errmsg}` body returned for upstream-facing failures.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Envelope {
    pub errcode: i32,
    pub errmsg: String,
}

impl Envelope {
    pub fn new(errmsg: impl Into<String>) -> Self {
        Self {
            errcode: ENVELOPE_ERRCODE,
            errmsg: errmsg.into(),
        }
    }

    /// Compact JSON response with the given status.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            format!(r#"{{"errcode":{},"errmsg":"Proxy error"}}"#, ENVELOPE_ERRCODE)
        });
        (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            )],
            body,
        )
            .into_response()
    }
}

/// Failures that happen before response headers reach the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The outbound request target could not be built from the inbound request.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    /// No upstream response headers within the configured timeout.
    #[error("Gateway timeout")]
    Timeout,

    /// Connect, DNS, TLS, reset or premature close before headers.
    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    /// Transport failure carrying only the root cause of `err` as its message.
    pub fn transport(err: &(dyn StdError + 'static)) -> Self {
        ProxyError::Transport(root_cause(err))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvalidTarget(_) | ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::Timeout => ErrorKind::Timeout,
            ProxyError::InvalidTarget(_) | ProxyError::Transport(_) => ErrorKind::Upstream,
        }
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            ProxyError::Timeout => Envelope::new("Gateway timeout"),
            other => Envelope::new(format!("Proxy error: {}", other)),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.envelope().into_response_with(self.status())
    }
}

/// Innermost error message in a source chain.
pub fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
