//! Upstream client and target construction.
//!
//! One fresh connection per forwarded request, pointed at one host. The
//! request line carries the inbound path and query exactly as received: no
//! dot-segment resolution, no re-encoding. Every outbound request also
//! carries `Connection: close`, so nothing is ever reused.

use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, Uri};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::config::UpstreamConfig;
use crate::proxy::error::ProxyError;
use crate::resilience::{Deadline, HeaderTimeout};

/// Error building the upstream client at startup.
#[derive(Debug, thiserror::Error)]
pub enum ClientInitError {
    #[error("upstream host '{0}' is not a valid Host header value")]
    Host(String),

    #[error("upstream host '{0}' is not a valid TLS server name")]
    ServerName(String),

    #[error("failed to build TLS client config: {0}")]
    Tls(#[from] rustls::Error),
}

/// TLS settings used when the upstream port is 443.
#[derive(Clone)]
struct TlsTarget {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Client for the single configured upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    host: String,
    port: u16,
    host_header: HeaderValue,
    tls: Option<TlsTarget>,
    timeout: HeaderTimeout,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ClientInitError> {
        let host_header = HeaderValue::from_str(&config.host)
            .map_err(|_| ClientInitError::Host(config.host.clone()))?;

        let tls = if config.scheme() == "https" {
            Some(tls_target(&config.host)?)
        } else {
            None
        };

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            host_header,
            tls,
            timeout: HeaderTimeout::from_millis(config.timeout_ms),
        })
    }

    /// Configured upstream host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Value forced into every outbound `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Outbound request target for an inbound path and query, kept byte for byte.
    pub fn target(&self, path_and_query: &str) -> Result<PathAndQuery, ProxyError> {
        if !path_and_query.starts_with('/') {
            return Err(ProxyError::InvalidTarget(format!(
                "'{}' is not an origin-form path",
                path_and_query
            )));
        }
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| ProxyError::InvalidTarget(e.to_string()))
    }

    /// Connect, send, and wait for response headers, bounded by the timeout.
    ///
    /// On timeout the attempt is dropped, which closes its socket.
    pub async fn send(
        &self,
        method: Method,
        target: PathAndQuery,
        headers: HeaderMap,
        body: Body,
    ) -> Result<Response<Incoming>, ProxyError> {
        let mut request = Request::new(body);
        *request.method_mut() = method;
        *request.uri_mut() = Uri::from(target);
        *request.headers_mut() = headers;

        self.timeout
            .run(self.exchange(request))
            .await
            .map_err(|outcome| match outcome {
                Deadline::Elapsed => ProxyError::Timeout,
                Deadline::Failed(e) => e,
            })
    }

    async fn exchange(&self, request: Request<Body>) -> Result<Response<Incoming>, ProxyError> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| ProxyError::transport(&e))?;
        let _ = tcp.set_nodelay(true);

        match &self.tls {
            Some(tls) => {
                let stream = tls
                    .connector
                    .connect(tls.server_name.clone(), tcp)
                    .await
                    .map_err(|e| ProxyError::transport(&e))?;
                dispatch(stream, request).await
            }
            None => dispatch(tcp, request).await,
        }
    }
}

/// HTTP/1.1 exchange over an established stream.
async fn dispatch<S>(stream: S, request: Request<Body>) -> Result<Response<Incoming>, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| ProxyError::transport(&e))?;

    // Drives the socket until the response body is fully read or dropped.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "Upstream connection closed with error");
        }
    });

    sender
        .send_request(request)
        .await
        .map_err(|e| ProxyError::transport(&e))
}

fn tls_target(host: &str) -> Result<TlsTarget, ClientInitError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| ClientInitError::ServerName(host.to_string()))?;

    Ok(TlsTarget {
        connector: TlsConnector::from(Arc::new(config)),
        server_name,
    })
}
