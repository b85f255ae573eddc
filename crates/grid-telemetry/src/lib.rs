//! Structured logging for the grid bot.
//!
//! JSON output when `RUST_ENV=production`, pretty output otherwise.
//! `RUST_LOG` overrides the configured filter.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
