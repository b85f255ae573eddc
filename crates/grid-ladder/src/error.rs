//! Ladder error types.

use grid_core::{ClientOrderId, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LadderError {
    #[error("Duplicate client order ID: {0}")]
    DuplicateOrderId(ClientOrderId),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type LadderResult<T> = Result<T, LadderError>;
