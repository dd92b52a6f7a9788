//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{LogFormat, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// Starts from defaults, applies the optional TOML file, then the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` returns the raw value for a variable name; values that do not
/// parse are reported rather than ignored.
pub fn apply_env<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var(&lookup, "PROXY_PORT")? {
        config.listener.port = port;
    }
    if let Some(host) = lookup("TARGET_HOST") {
        config.upstream.host = host;
    }
    if let Some(port) = parse_var(&lookup, "TARGET_PORT")? {
        config.upstream.port = port;
    }
    if let Some(timeout_ms) = parse_var(&lookup, "PROXY_TIMEOUT_MS")? {
        config.upstream.timeout_ms = timeout_ms;
    }
    if let Some(grace_secs) = parse_var(&lookup, "SHUTDOWN_GRACE_SECS")? {
        config.shutdown.grace_secs = grace_secs;
    }
    if let Some(format) = parse_var::<_, LogFormat>(&lookup, "LOG_FORMAT")? {
        config.observability.log_format = format;
    }
    if let Some(address) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(address);
    }
    Ok(())
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}
