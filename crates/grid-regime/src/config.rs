//! Regime classifier configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RegimeError, RegimeResult};

/// Indicator periods and hysteresis thresholds.
///
/// Indicator maths runs in `f64`, so thresholds are plain floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// Fast EMA period (bars).
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,

    /// Slow EMA period (bars).
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,

    /// ADX period (bars). The ADX reads zero until `2 * adx_period` bars.
    #[serde(default = "default_adx_period")]
    pub adx_period: usize,

    /// ATR period (bars).
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Extra bars beyond `slow_period` before the classifier is warm.
    #[serde(default = "default_warmup_buffer")]
    pub warmup_buffer: usize,

    /// EMA spread (bps of close) required to enter a trend.
    #[serde(default = "default_enter_bps")]
    pub enter_bps: f64,

    /// EMA spread (bps of close) below which an existing trend is left.
    /// Must be smaller than `enter_bps`.
    #[serde(default = "default_exit_bps")]
    pub exit_bps: f64,

    /// ADX required to enter a trend.
    #[serde(default = "default_adx_enter")]
    pub adx_enter: f64,

    /// ADX below which an existing trend is left.
    #[serde(default = "default_adx_exit")]
    pub adx_exit: f64,
}

impl RegimeConfig {
    /// Bars required before `regime()` may be used for trading decisions.
    pub fn warmup_bars(&self) -> usize {
        self.slow_period + self.warmup_buffer
    }

    pub fn validate(&self) -> RegimeResult<()> {
        if self.fast_period == 0 || self.adx_period == 0 || self.atr_period == 0 {
            return Err(RegimeError::ConfigError(
                "indicator periods must be positive".to_string(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(RegimeError::ConfigError(format!(
                "fast_period {} must be below slow_period {}",
                self.fast_period, self.slow_period
            )));
        }
        let thresholds = [self.enter_bps, self.exit_bps, self.adx_enter, self.adx_exit];
        if thresholds.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(RegimeError::ConfigError(
                "thresholds must be finite and non-negative".to_string(),
            ));
        }
        if self.exit_bps >= self.enter_bps {
            return Err(RegimeError::ConfigError(format!(
                "exit_bps {} must be below enter_bps {}",
                self.exit_bps, self.enter_bps
            )));
        }
        if self.adx_exit > self.adx_enter {
            return Err(RegimeError::ConfigError(format!(
                "adx_exit {} must not exceed adx_enter {}",
                self.adx_exit, self.adx_enter
            )));
        }
        Ok(())
    }
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            adx_period: default_adx_period(),
            atr_period: default_atr_period(),
            warmup_buffer: default_warmup_buffer(),
            enter_bps: default_enter_bps(),
            exit_bps: default_exit_bps(),
            adx_enter: default_adx_enter(),
            adx_exit: default_adx_exit(),
        }
    }
}

fn default_fast_period() -> usize {
    12
}
fn default_slow_period() -> usize {
    26
}
fn default_adx_period() -> usize {
    14
}
fn default_atr_period() -> usize {
    14
}
fn default_warmup_buffer() -> usize {
    10
}
fn default_enter_bps() -> f64 {
    30.0
}
fn default_exit_bps() -> f64 {
    15.0
}
fn default_adx_enter() -> f64 {
    25.0
}
fn default_adx_exit() -> f64 {
    20.0
}
