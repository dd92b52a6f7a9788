//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (bound the wait for response headers)
//!     → On expiry: attempt dropped, 504 returned
//! ```
//!
//! # Design Decisions
//! - Every upstream attempt has a deadline
//! - No retries: forwarded requests are not assumed idempotent

pub mod timeouts;

pub use timeouts::{Deadline, HeaderTimeout};
