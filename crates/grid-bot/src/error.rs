//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] grid_core::CoreError),

    #[error("Regime error: {0}")]
    Regime(#[from] grid_regime::RegimeError),

    #[error("Ladder error: {0}")]
    Ladder(#[from] grid_ladder::LadderError),

    #[error("Risk error: {0}")]
    Risk(#[from] grid_risk::RiskError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] grid_telemetry::TelemetryError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Replay error at line {line}: {reason}")]
    Replay { line: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel closed")]
    ChannelClosed,
}

pub type AppResult<T> = Result<T, AppError>;
