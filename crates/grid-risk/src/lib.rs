//! Risk gates for the grid strategy.
//!
//! Checked at the pipeline entry point before any ladder work:
//! - DrawdownGate: pauses when equity falls too far below its peak
//! - CircuitBreaker: blocks order-producing work after an error burst
//! - PositionSizeGate: rejects adds that would over-size a position
//!
//! `RiskState` owns all three and exposes a `RiskStatus` for status queries.

pub mod circuit_breaker;
pub mod config;
pub mod drawdown;
pub mod error;
pub mod position_size;
pub mod state;

pub use circuit_breaker::CircuitBreaker;
pub use config::RiskConfig;
pub use drawdown::{DrawdownCheck, DrawdownGate, DrawdownTransition};
pub use error::{RiskError, RiskResult};
pub use position_size::{PositionBudget, PositionSizeGate};
pub use state::{PauseReason, RiskState, RiskStatus};
