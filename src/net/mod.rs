//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, all interfaces by default)
//!     → Hand off to HTTP layer (axum::serve)
//!
//! Forwarded request
//!     → connection.rs (in-flight guard until the relay finishes)
//! ```

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
