//! Structured logging initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, TelemetryConfig};
use crate::error::{TelemetryError, TelemetryResult};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over `config.log_filter`. Logs go to stderr; stdout is
/// left to the command stream. Fails if a global subscriber is already
/// installed.
pub fn init_logging(config: &TelemetryConfig) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter).map_err(|e| {
            TelemetryError::InvalidFilter {
                filter: config.log_filter.clone(),
                reason: e.to_string(),
            }
        })?,
    };

    let rust_env = std::env::var("RUST_ENV").ok();

    let result = match config.format.resolve(rust_env.as_deref()) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty()
                    .with_target(true)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
