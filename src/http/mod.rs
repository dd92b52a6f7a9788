//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id in the log span)
//!     → admin routes or the forwarding fallback (proxy)
//!     → response.rs (preflight, panic envelope, JSON helpers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::RequestId;
pub use server::{AppState, HttpServer};
