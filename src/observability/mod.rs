//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding pipeline and status handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (ProxyStats counters + metrics facade)
//!     → process.rs (memory snapshot on demand)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → /health and /stats
//!     → Prometheus scrape (optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod process;

pub use metrics::{ErrorKind, ProxyStats};
