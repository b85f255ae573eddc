//! Application configuration.
//!
//! Loaded from a TOML file layered with `GRID__`-prefixed environment
//! overrides, e.g. `GRID__STRATEGY__LADDER__STEP_BPS=40`.

use grid_core::InstrumentSpec;
use grid_ladder::{ExitConfig, FundingConfig, LadderConfig, RetryConfig, ShaperConfig, ToleranceConfig};
use grid_regime::RegimeConfig;
use grid_risk::RiskConfig;
use grid_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "GRID";
const ENV_SEPARATOR: &str = "__";

/// Every component config the strategy pipeline needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub ladder: LadderConfig,
    #[serde(default)]
    pub shaper: ShaperConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    /// Client order ID prefix. A short random tag when unset.
    #[serde(default)]
    pub id_prefix: Option<String>,
}

impl StrategyConfig {
    pub fn validate(&self) -> AppResult<()> {
        self.regime.validate()?;
        self.ladder.validate()?;
        self.shaper.validate()?;
        self.funding.validate()?;
        self.tolerance.validate()?;
        self.exit.validate()?;
        self.risk.validate()?;
        if self.retry.taker_reject_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(AppError::Config(
                "retry.taker_reject_patterns must not contain empty patterns".to_string(),
            ));
        }
        if let Some(prefix) = &self.id_prefix {
            if prefix.is_empty() || prefix.contains('-') {
                return Err(AppError::Config(format!(
                    "id_prefix must be non-empty and contain no '-', got '{prefix}'"
                )));
            }
        }
        Ok(())
    }
}

/// Host-side runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Capacity of the actor's event queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub instrument: InstrumentSpec,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    /// Load from a TOML file plus `GRID__*` environment overrides, then validate.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let app: AppConfig = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        app.validate()?;
        Ok(app)
    }

    /// Parse from a TOML string without environment overrides.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let app: AppConfig = toml_from_str(content)?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.instrument.validate()?;
        self.strategy.validate()?;
        if self.runtime.channel_capacity == 0 {
            return Err(AppError::Config(
                "runtime.channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn toml_from_str(content: &str) -> AppResult<AppConfig> {
    config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Toml))
        .build()
        .and_then(|settings| settings.try_deserialize::<AppConfig>())
        .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
}
