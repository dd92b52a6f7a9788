//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Only requests whose path starts with this prefix are forwarded upstream.
pub const FORWARD_PREFIX: &str = "/cgi-bin/";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// The single upstream every forwarded request goes to.
    pub upstream: UpstreamConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3120,
        }
    }
}

impl ListenerConfig {
    /// `bind_address:port` as a socket address string.
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream host name. Also the value forced into the outbound `Host` header.
    pub host: String,

    /// Upstream port. Port 443 selects HTTPS, anything else plain HTTP.
    pub port: u16,

    /// Deadline for upstream response headers, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "qyapi.weixin.qq.com".to_string(),
            port: 443,
            timeout_ms: 60_000,
        }
    }
}

impl UpstreamConfig {
    /// URL scheme derived from the port.
    pub fn scheme(&self) -> &'static str {
        if self.port == 443 {
            "https"
        } else {
            "http"
        }
    }

    /// Path prefix that is forwarded.
    pub fn path_prefix(&self) -> &'static str {
        FORWARD_PREFIX
    }
}

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight requests may keep running after a shutdown signal.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Prometheus scrape address; the exporter is disabled when unset.
    pub metrics_address: Option<String>,
}
