//! Regime-adaptive grid strategy.
//!
//! Pipeline entry point and host-side plumbing:
//! - `strategy`: `GridStrategy`, the per-update pipeline and order-event handling
//! - `position`: per-side position book and realized PnL
//! - `app`: single-writer actor that serializes host events
//! - `replay`: JSON-lines event source and command sink
//! - `config`: layered application configuration

pub mod app;
pub mod config;
pub mod error;
pub mod position;
pub mod replay;
pub mod strategy;

pub use app::{ActorStats, HostEvent, OrderGateway, StatusHandle, StrategyActor};
pub use config::{AppConfig, RuntimeConfig, StrategyConfig};
pub use error::{AppError, AppResult};
pub use position::{PositionBook, SidePosition};
pub use strategy::{GridStrategy, SkipReason, StrategyStatus, UpdateOutcome};
