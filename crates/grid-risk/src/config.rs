//! Risk gate configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RiskError, RiskResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Drawdown from peak equity (percent) that pauses trading.
    #[serde(default = "default_max_drawdown_pct")]
    pub max_drawdown_pct: Decimal,

    /// Trading resumes once drawdown is back to
    /// `max_drawdown_pct - resume_hysteresis_pct` or better.
    #[serde(default = "default_resume_hysteresis_pct")]
    pub resume_hysteresis_pct: Decimal,

    /// Rejections/denials tolerated within `error_window_ms`.
    #[serde(default = "default_max_errors_per_minute")]
    pub max_errors_per_minute: u32,

    /// Trailing window the breaker counts errors over.
    #[serde(default = "default_error_window_ms")]
    pub error_window_ms: u64,

    /// How long a tripped breaker blocks order-producing work.
    #[serde(default = "default_breaker_cooldown_ms")]
    pub breaker_cooldown_ms: u64,

    /// Largest per-side position notional as a fraction of balance.
    #[serde(default = "default_max_position_fraction")]
    pub max_position_fraction: Decimal,
}

impl RiskConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if self.max_drawdown_pct <= Decimal::ZERO || self.max_drawdown_pct >= Decimal::ONE_HUNDRED
        {
            return Err(RiskError::ConfigError(format!(
                "max_drawdown_pct must be in (0, 100), got {}",
                self.max_drawdown_pct
            )));
        }
        if self.resume_hysteresis_pct.is_sign_negative()
            || self.resume_hysteresis_pct > self.max_drawdown_pct
        {
            return Err(RiskError::ConfigError(format!(
                "resume_hysteresis_pct must be in [0, max_drawdown_pct], got {}",
                self.resume_hysteresis_pct
            )));
        }
        if self.error_window_ms == 0 {
            return Err(RiskError::ConfigError(
                "error_window_ms must be positive".to_string(),
            ));
        }
        if self.max_position_fraction <= Decimal::ZERO {
            return Err(RiskError::ConfigError(format!(
                "max_position_fraction must be positive, got {}",
                self.max_position_fraction
            )));
        }
        Ok(())
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown_pct: default_max_drawdown_pct(),
            resume_hysteresis_pct: default_resume_hysteresis_pct(),
            max_errors_per_minute: default_max_errors_per_minute(),
            error_window_ms: default_error_window_ms(),
            breaker_cooldown_ms: default_breaker_cooldown_ms(),
            max_position_fraction: default_max_position_fraction(),
        }
    }
}

fn default_max_drawdown_pct() -> Decimal {
    Decimal::new(10, 0) // 10%
}
fn default_resume_hysteresis_pct() -> Decimal {
    Decimal::new(2, 0) // resume at 8%
}
fn default_max_errors_per_minute() -> u32 {
    10
}
fn default_error_window_ms() -> u64 {
    60_000
}
fn default_breaker_cooldown_ms() -> u64 {
    300_000 // 5 minutes
}
fn default_max_position_fraction() -> Decimal {
    Decimal::new(5, 1) // 0.5 = 50% of balance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = RiskConfig::default();
        assert_eq!(config.max_drawdown_pct, dec!(10));
        assert_eq!(config.resume_hysteresis_pct, dec!(2));
        assert_eq!(config.max_errors_per_minute, 10);
        assert_eq!(config.error_window_ms, 60_000);
        assert_eq!(config.max_position_fraction, dec!(0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_override() {
        let config: RiskConfig = toml::from_str(
            r#"
            max_drawdown_pct = "15"
            breaker_cooldown_ms = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.max_drawdown_pct, dec!(15));
        assert_eq!(config.breaker_cooldown_ms, 1000);
        assert_eq!(config.max_errors_per_minute, 10);
    }

    #[test]
    fn test_hysteresis_larger_than_threshold_rejected() {
        let config = RiskConfig {
            resume_hysteresis_pct: dec!(20),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
