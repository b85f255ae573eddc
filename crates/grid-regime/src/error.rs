//! Regime error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegimeError {
    #[error("Malformed bar at {ts_ms}: {reason}")]
    MalformedBar { ts_ms: u64, reason: String },

    #[error("Classifier not warm: {seen}/{required} bars")]
    NotWarm { seen: usize, required: usize },

    #[error("Indicator error: {0}")]
    Indicator(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<grid_core::CoreError> for RegimeError {
    fn from(err: grid_core::CoreError) -> Self {
        match err {
            grid_core::CoreError::MalformedBar { ts_ms, reason } => {
                Self::MalformedBar { ts_ms, reason }
            }
            other => Self::Indicator(other.to_string()),
        }
    }
}

pub type RegimeResult<T> = Result<T, RegimeError>;
