//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream host must not be empty")]
    EmptyUpstreamHost,

    #[error("upstream port must be non-zero")]
    ZeroUpstreamPort,

    #[error("upstream timeout must be non-zero")]
    ZeroTimeout,

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }
    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.listener.bind_address.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
