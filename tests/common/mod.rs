//! Shared utilities for integration tests: mock upstreams and a relay harness.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use cgi_relay::{HttpServer, ProxyConfig, ProxyStats, Shutdown};

/// What the echo upstream saw.
#[derive(Debug, Serialize, Deserialize)]
pub struct EchoReport {
    pub method: String,
    pub path: String,
    pub host: Option<String>,
    pub connection: Option<String>,
    pub forwarded_for: Option<String>,
    pub forwarded_proto: Option<String>,
    pub body_len: usize,
}

/// Deterministic payload of `n` bytes.
pub fn payload(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(request: Request) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();

    match request.uri().path() {
        // Returns the request body unchanged.
        "/cgi-bin/body" => {
            let body = to_bytes(request.into_body(), usize::MAX).await.unwrap();
            Body::from(body).into_response()
        }
        // Returns `n` payload bytes.
        "/cgi-bin/bytes" => {
            let n = request
                .uri()
                .query()
                .and_then(|q| q.strip_prefix("n="))
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            Body::from(payload(n)).into_response()
        }
        "/cgi-bin/teapot" => (
            StatusCode::IM_A_TEAPOT,
            [("x-upstream", "yes"), ("content-type", "text/plain")],
            "short and stout",
        )
            .into_response(),
        _ => {
            let report = EchoReport {
                method: request.method().to_string(),
                path,
                host: header(&request, "host"),
                connection: header(&request, "connection"),
                forwarded_for: header(&request, "x-forwarded-for"),
                forwarded_proto: header(&request, "x-forwarded-proto"),
                body_len: to_bytes(request.into_body(), usize::MAX).await.unwrap().len(),
            };
            Json(report).into_response()
        }
    }
}

/// Start an axum upstream that reports what it received.
pub async fn start_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Start a raw TCP upstream; `f` gets each accepted socket.
pub async fn start_raw_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = Arc::clone(&f);
                    tokio::spawn(async move { f(socket).await });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// Read the request head (best effort, enough for small test requests).
pub async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = vec![0u8; 4096];
    let mut seen = Vec::new();
    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => seen.extend_from_slice(&buf[..n]),
        }
    }
}

/// Upstream that answers 200 with `body` after `delay`.
pub async fn start_slow_upstream(delay: Duration, body: &'static str) -> SocketAddr {
    start_raw_upstream(move |mut socket| async move {
        read_request_head(&mut socket).await;
        tokio::time::sleep(delay).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    })
    .await
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Relay config pointing at a local plain-HTTP upstream.
pub fn relay_config(upstream_port: u16) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstream.host = "127.0.0.1".into();
    config.upstream.port = upstream_port;
    config.upstream.timeout_ms = 5_000;
    config.shutdown.grace_secs = 5;
    config
}

/// A relay running in the background.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub stats: Arc<ProxyStats>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(config: ProxyConfig) -> TestRelay {
    let stats = Arc::new(ProxyStats::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, Arc::clone(&stats)).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestRelay {
        addr,
        stats,
        shutdown,
        handle,
    }
}

/// HTTP client that ignores proxy env vars and never pools.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Send `GET <target>` over a bare socket so the request line is exactly
/// `target`, then return the status code and body text.
pub async fn raw_get(addr: SocketAddr, target: &str) -> (u16, String) {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    socket.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).into_owned();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    (status, body.to_string())
}

/// The echo report inside a raw response body.
pub fn echo_report(body: &str) -> EchoReport {
    let start = body.find('{').unwrap();
    let end = body.rfind('}').unwrap();
    serde_json::from_str(&body[start..=end]).unwrap()
}
