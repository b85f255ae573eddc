//! Ladder pipeline configuration.
//!
//! One immutable value object per stage, passed explicitly into each pure
//! function.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LadderError, LadderResult};

/// Ladder geometry and grid-center behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Distance between adjacent rungs in basis points of the center.
    #[serde(default = "default_step_bps")]
    pub step_bps: Decimal,

    /// Number of LONG (bid) rungs below the center.
    #[serde(default = "default_levels")]
    pub levels_long: u32,

    /// Number of SHORT (ask) rungs above the center.
    #[serde(default = "default_levels")]
    pub levels_short: u32,

    /// Quantity of the nearest rung (base units).
    #[serde(default = "default_base_qty")]
    pub base_qty: Decimal,

    /// Geometric growth of quantity per level.
    #[serde(default = "default_qty_scale")]
    pub qty_scale: Decimal,

    /// Distance (bps) the mid must move from the center before re-centering.
    #[serde(default = "default_recenter_trigger_bps")]
    pub recenter_trigger_bps: Decimal,
}

impl LadderConfig {
    pub fn validate(&self) -> LadderResult<()> {
        if self.step_bps <= Decimal::ZERO || self.step_bps >= Decimal::from(10_000) {
            return Err(LadderError::ConfigError(format!(
                "step_bps must be in (0, 10000), got {}",
                self.step_bps
            )));
        }
        // The furthest LONG rung must stay above zero.
        let depth = self.step_bps * Decimal::from(self.levels_long);
        if depth >= Decimal::from(10_000) {
            return Err(LadderError::ConfigError(format!(
                "levels_long {} x step_bps {} reaches zero price",
                self.levels_long, self.step_bps
            )));
        }
        if self.base_qty <= Decimal::ZERO {
            return Err(LadderError::ConfigError(format!(
                "base_qty must be positive, got {}",
                self.base_qty
            )));
        }
        if self.qty_scale <= Decimal::ZERO {
            return Err(LadderError::ConfigError(format!(
                "qty_scale must be positive, got {}",
                self.qty_scale
            )));
        }
        if self.recenter_trigger_bps.is_sign_negative() {
            return Err(LadderError::ConfigError(
                "recenter_trigger_bps must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            step_bps: default_step_bps(),
            levels_long: default_levels(),
            levels_short: default_levels(),
            base_qty: default_base_qty(),
            qty_scale: default_qty_scale(),
            recenter_trigger_bps: default_recenter_trigger_bps(),
        }
    }
}

/// Counter-trend throttling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaperConfig {
    /// Rungs kept on the counter-trend ladder.
    #[serde(default = "default_counter_levels")]
    pub counter_levels: u32,

    /// Quantity multiplier for kept counter-trend rungs, in [0, 1).
    #[serde(default = "default_counter_qty_scale")]
    pub counter_qty_scale: Decimal,
}

impl ShaperConfig {
    pub fn validate(&self) -> LadderResult<()> {
        if self.counter_qty_scale.is_sign_negative() || self.counter_qty_scale >= Decimal::ONE {
            return Err(LadderError::ConfigError(format!(
                "counter_qty_scale must be in [0, 1), got {}",
                self.counter_qty_scale
            )));
        }
        Ok(())
    }
}

impl Default for ShaperConfig {
    fn default() -> Self {
        Self {
            counter_levels: default_counter_levels(),
            counter_qty_scale: default_counter_qty_scale(),
        }
    }
}

/// Funding-cost guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingConfig {
    /// Samples older than `now - window_ms` are evicted.
    #[serde(default = "default_funding_window_ms")]
    pub window_ms: u64,

    /// Forward horizon the cost is projected over.
    #[serde(default = "default_funding_horizon_ms")]
    pub horizon_ms: u64,

    /// Venue funding interval the rate applies to.
    #[serde(default = "default_funding_interval_ms")]
    pub funding_interval_ms: u64,

    /// Projected cost (bps of notional) above which the paying side is scaled.
    #[serde(default = "default_max_cost_bps")]
    pub max_cost_bps: Decimal,
}

impl FundingConfig {
    pub fn validate(&self) -> LadderResult<()> {
        if self.funding_interval_ms == 0 {
            return Err(LadderError::ConfigError(
                "funding_interval_ms must be positive".to_string(),
            ));
        }
        if self.max_cost_bps.is_sign_negative() {
            return Err(LadderError::ConfigError(format!(
                "max_cost_bps must be non-negative, got {}",
                self.max_cost_bps
            )));
        }
        Ok(())
    }
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            window_ms: default_funding_window_ms(),
            horizon_ms: default_funding_horizon_ms(),
            funding_interval_ms: default_funding_interval_ms(),
            max_cost_bps: default_max_cost_bps(),
        }
    }
}

/// Reconciliation tolerances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Live price may differ from desired by up to this many bps.
    #[serde(default = "default_price_tolerance_bps")]
    pub price_tolerance_bps: Decimal,

    /// Live quantity may differ from desired by up to this percentage.
    #[serde(default = "default_qty_tolerance_pct")]
    pub qty_tolerance_pct: Decimal,
}

impl ToleranceConfig {
    pub fn validate(&self) -> LadderResult<()> {
        if self.price_tolerance_bps.is_sign_negative() || self.qty_tolerance_pct.is_sign_negative()
        {
            return Err(LadderError::ConfigError(
                "tolerances must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            price_tolerance_bps: default_price_tolerance_bps(),
            qty_tolerance_pct: default_qty_tolerance_pct(),
        }
    }
}

/// Would-be-taker retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed per logical order.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Case-insensitive substrings marking a rejection as would-be-taker.
    #[serde(default = "default_taker_reject_patterns")]
    pub taker_reject_patterns: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            taker_reject_patterns: default_taker_reject_patterns(),
        }
    }
}

/// Take-profit / stop-loss placement after grid fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Take-profit distance in grid steps (favorable side).
    #[serde(default = "default_tp_steps")]
    pub tp_steps: Decimal,

    /// Stop-loss distance in grid steps (unfavorable side).
    #[serde(default = "default_sl_steps")]
    pub sl_steps: Decimal,
}

impl ExitConfig {
    pub fn validate(&self) -> LadderResult<()> {
        if self.tp_steps <= Decimal::ZERO || self.sl_steps <= Decimal::ZERO {
            return Err(LadderError::ConfigError(format!(
                "tp_steps ({}) and sl_steps ({}) must be positive",
                self.tp_steps, self.sl_steps
            )));
        }
        Ok(())
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            tp_steps: default_tp_steps(),
            sl_steps: default_sl_steps(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_step_bps() -> Decimal {
    Decimal::new(50, 0) // 50 bps between rungs
}
fn default_levels() -> u32 {
    5
}
fn default_base_qty() -> Decimal {
    Decimal::new(1, 2) // 0.01
}
fn default_qty_scale() -> Decimal {
    Decimal::new(11, 1) // 1.1
}
fn default_recenter_trigger_bps() -> Decimal {
    Decimal::new(100, 0) // 2 steps
}
fn default_counter_levels() -> u32 {
    2
}
fn default_counter_qty_scale() -> Decimal {
    Decimal::new(5, 1) // 0.5
}
fn default_funding_window_ms() -> u64 {
    86_400_000 // 24 hours
}
fn default_funding_horizon_ms() -> u64 {
    28_800_000 // 8 hours
}
fn default_funding_interval_ms() -> u64 {
    28_800_000 // 8 hours
}
fn default_max_cost_bps() -> Decimal {
    Decimal::new(5, 0) // 5 bps
}
fn default_price_tolerance_bps() -> Decimal {
    Decimal::new(5, 0) // 5 bps
}
fn default_qty_tolerance_pct() -> Decimal {
    Decimal::new(5, 0) // 5 %
}
fn default_max_attempts() -> u32 {
    3
}
fn default_taker_reject_patterns() -> Vec<String> {
    [
        "post only",
        "post-only",
        "would immediately match",
        "would take",
        "would cross",
        "-5022",
        "alo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_tp_steps() -> Decimal {
    Decimal::ONE
}
fn default_sl_steps() -> Decimal {
    Decimal::new(3, 0)
}
