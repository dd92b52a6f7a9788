use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::http::response::pretty_json;
use crate::http::server::AppState;
use crate::lifecycle::startup::SERVICE_NAME;
use crate::observability::process::{memory_usage, MemoryUsage};
use crate::observability::ProxyStats;

/// Service identifier reported by `/health`.
pub const SERVICE_ID: &str = "wecom-proxy";

#[derive(Debug, Serialize)]
pub struct TargetInfo {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub uptime: f64,
    pub memory_usage: MemoryUsage,
}

impl StatsSnapshot {
    pub fn capture(stats: &ProxyStats) -> Self {
        Self {
            total_requests: stats.total_requests(),
            total_errors: stats.total_errors(),
            uptime: stats.uptime().as_secs_f64(),
            memory_usage: memory_usage(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub target: TargetInfo,
    pub stats: StatsSnapshot,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub timestamp: String,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn get_health(State(state): State<AppState>) -> Response {
    pretty_json(&HealthReport {
        status: "ok",
        service: SERVICE_ID,
        version: env!("CARGO_PKG_VERSION"),
        target: TargetInfo {
            host: state.config.upstream.host.clone(),
            port: state.config.upstream.port,
        },
        stats: StatsSnapshot::capture(&state.stats),
        timestamp: timestamp(),
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Response {
    pretty_json(&StatsReport {
        stats: StatsSnapshot::capture(&state.stats),
        timestamp: timestamp(),
    })
}

pub async fn get_help(State(state): State<AppState>) -> Response {
    let upstream = &state.config.upstream;
    let body = format!(
        "
{title}
{underline}

Endpoints:
  GET  /health          - Health check
  GET  /stats           - Request statistics
  GET  /                - This help message

Proxy:
  All {prefix}* requests are proxied to {host}:{port}

Environment Variables:
  PROXY_PORT   - Proxy listen port (default: 3120)
  TARGET_HOST  - Target server (default: qyapi.weixin.qq.com)
  TARGET_PORT  - Target port (default: 443)

Stats:
  Total Requests: {requests}
  Total Errors: {errors}
  Uptime: {uptime}s
",
        title = SERVICE_NAME,
        underline = "=".repeat(SERVICE_NAME.len()),
        prefix = upstream.path_prefix(),
        host = upstream.host,
        port = upstream.port,
        requests = state.stats.total_requests(),
        errors = state.stats.total_errors(),
        uptime = state.stats.uptime().as_secs(),
    );

    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}
