//! # symsift utilities
//!
//! Shared utilities, logging, and helpers for symsift.
//!
//! This crate provides the logging infrastructure used across the workspace,
//! built on `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
