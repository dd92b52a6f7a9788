//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a request path is forwarded or rejected
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-wise on the raw path
//! - No percent-decoding beyond what the HTTP layer already did
//! - No regex: a single prefix comparison

use axum::http::Uri;

/// Outcome of the route gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Send the request upstream.
    Forward,
    /// Answer 404 locally without contacting upstream.
    Reject,
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if the path starts with the prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Route decision for a request URI.
    pub fn decide(&self, uri: &Uri) -> RouteDecision {
        if self.matches(uri.path()) {
            RouteDecision::Forward
        } else {
            RouteDecision::Reject
        }
    }
}
