//! Market regime classification.
//!
//! Feeds OHLCV bars one at a time into fast/slow EMAs, an ATR and a Wilder
//! ADX, and classifies the market as UP, DOWN or SIDEWAYS using separate
//! entry and exit thresholds so the regime does not flip-flop near a
//! boundary.

pub mod adx;
pub mod classifier;
pub mod config;
pub mod error;

pub use adx::WilderAdx;
pub use classifier::{classify, IndicatorSnapshot, Regime, RegimeClassifier, TrendSignal};
pub use config::RegimeConfig;
pub use error::{RegimeError, RegimeResult};
