//! CGI relay library.
//!
//! Forwards `/cgi-bin/` requests to one fixed upstream host with the `Host`
//! header rewritten, streaming bodies in both directions.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::ProxyStats;
