//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Log banner → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Tasks (tasks.rs):
//!     Detached relay pumps → panic logged and counted
//! ```
//!
//! # Design Decisions
//! - Shutdown has a grace period: remaining work is dropped after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod tasks;

pub use shutdown::Shutdown;
