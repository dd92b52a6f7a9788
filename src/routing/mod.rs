//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (prefix check)
//!     → Return: Forward or Reject
//! ```
//!
//! # Design Decisions
//! - One prefix, one upstream; the matcher is built once at startup
//! - Deterministic: same input always gets the same decision

pub mod matcher;

pub use matcher::{PathPrefixMatcher, RouteDecision};
