//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → environment overlay (loader.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared by value with every subsystem
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload path
//! - All fields have defaults to allow running with no configuration at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, ShutdownConfig, UpstreamConfig,
    FORWARD_PREFIX,
};
