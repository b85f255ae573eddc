//! Grid ladder pipeline.
//!
//! Turns a reference price and regime into a set of resting orders and
//! converges the live order state toward it:
//! - `builder`: geometric price ladders around a sticky grid center
//! - `shaper`: counter-trend throttling
//! - `funding`: funding-cost guard over a rolling rate window
//! - `precision`: tick/step quantization and minimum-notional filtering
//! - `live_orders`: live-order table keyed by ID and grid slot
//! - `reconcile`: minimal add/cancel/replace diff
//! - `retry`: would-be-taker retry with fresh IDs
//! - `exits`: take-profit / stop-loss orders for grid fills

pub mod builder;
pub mod config;
pub mod error;
pub mod exits;
pub mod funding;
pub mod ladder;
pub mod live_orders;
pub mod precision;
pub mod reconcile;
pub mod retry;
pub mod shaper;

pub use builder::{build, GridCenter};
pub use config::{ExitConfig, FundingConfig, LadderConfig, RetryConfig, ShaperConfig, ToleranceConfig};
pub use error::{LadderError, LadderResult};
pub use exits::ExitPlanner;
pub use funding::{FundingGuard, FundingProjection};
pub use ladder::{Ladder, Ladders, Rung};
pub use live_orders::{FillUpdate, FinishedOrder, LiveOrderTable};
pub use precision::{quantize, QuantizedLadders};
pub use reconcile::{diff, PlannedReplace, ReconcilePlan};
pub use retry::{retry_price, RetryCoordinator, RetryOutcome, RetryRecord};
pub use shaper::{counter_trend_side, shape};
