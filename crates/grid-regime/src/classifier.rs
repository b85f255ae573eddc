//! Regime classifier.
//!
//! Each bar updates the fast/slow EMAs, ATR and ADX, then re-classifies
//! using the previous regime as hysteresis state:
//!
//! - SIDEWAYS → UP when spread > `enter_bps` and ADX > `adx_enter`
//! - UP stays UP while spread > `exit_bps` and ADX > `adx_exit`
//! - DOWN mirrors UP with the spread negated
//!
//! where spread = (fast EMA − slow EMA) / close × 10 000.

use grid_core::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;
use ta::indicators::{AverageTrueRange, ExponentialMovingAverage};
use ta::{DataItem, Next};
use tracing::{debug, info};

use crate::adx::WilderAdx;
use crate::config::RegimeConfig;
use crate::error::{RegimeError, RegimeResult};

/// Classified market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Up,
    Down,
    #[default]
    Sideways,
}

impl Regime {
    pub fn is_trending(&self) -> bool {
        !matches!(self, Self::Sideways)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
            Self::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

/// Inputs to the decision rule for one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSignal {
    /// (fast − slow) / close in basis points. Positive = fast above slow.
    pub spread_bps: f64,
    /// Trend strength.
    pub adx: f64,
}

/// Two-threshold decision rule.
///
/// Leaving a trend requires falling below the exit thresholds. Entering
/// one requires exceeding the stricter entry thresholds.
pub fn classify(previous: Regime, signal: TrendSignal, config: &RegimeConfig) -> Regime {
    let enters_up = signal.spread_bps > config.enter_bps && signal.adx > config.adx_enter;
    let enters_down = -signal.spread_bps > config.enter_bps && signal.adx > config.adx_enter;

    match previous {
        Regime::Up if signal.spread_bps > config.exit_bps && signal.adx > config.adx_exit => {
            Regime::Up
        }
        Regime::Down if -signal.spread_bps > config.exit_bps && signal.adx > config.adx_exit => {
            Regime::Down
        }
        _ if enters_up => Regime::Up,
        _ if enters_down => Regime::Down,
        _ => Regime::Sideways,
    }
}

/// Point-in-time indicator values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub adx: f64,
    pub atr: f64,
    pub spread_bps: f64,
    pub bars_seen: usize,
    pub regime: Regime,
}

/// Stateful classifier. One instance per instrument.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
    ema_fast: ExponentialMovingAverage,
    ema_slow: ExponentialMovingAverage,
    atr: AverageTrueRange,
    adx: WilderAdx,
    snapshot: IndicatorSnapshot,
}

impl RegimeClassifier {
    pub fn new(config: RegimeConfig) -> RegimeResult<Self> {
        config.validate()?;
        let ema_fast = ExponentialMovingAverage::new(config.fast_period)
            .map_err(|e| RegimeError::Indicator(format!("fast EMA: {e:?}")))?;
        let ema_slow = ExponentialMovingAverage::new(config.slow_period)
            .map_err(|e| RegimeError::Indicator(format!("slow EMA: {e:?}")))?;
        let atr = AverageTrueRange::new(config.atr_period)
            .map_err(|e| RegimeError::Indicator(format!("ATR: {e:?}")))?;
        let adx = WilderAdx::new(config.adx_period);

        Ok(Self {
            config,
            ema_fast,
            ema_slow,
            atr,
            adx,
            snapshot: IndicatorSnapshot {
                ema_fast: 0.0,
                ema_slow: 0.0,
                adx: 0.0,
                atr: 0.0,
                spread_bps: 0.0,
                bars_seen: 0,
                regime: Regime::Sideways,
            },
        })
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// Feed one bar. Malformed bars are rejected before any indicator moves.
    pub fn update(&mut self, bar: &Bar) -> RegimeResult<Regime> {
        bar.validate()?;
        let item = DataItem::builder()
            .open(bar.open)
            .high(bar.high)
            .low(bar.low)
            .close(bar.close)
            .volume(bar.volume)
            .build()
            .map_err(|e| RegimeError::MalformedBar {
                ts_ms: bar.timestamp_ms,
                reason: format!("{e:?}"),
            })?;

        let ema_fast = self.ema_fast.next(bar.close);
        let ema_slow = self.ema_slow.next(bar.close);
        let atr = self.atr.next(&item);
        let adx = self.adx.next(bar.high, bar.low, bar.close);
        let spread_bps = (ema_fast - ema_slow) / bar.close * 10_000.0;

        let previous = self.snapshot.regime;
        let regime = classify(previous, TrendSignal { spread_bps, adx }, &self.config);

        self.snapshot = IndicatorSnapshot {
            ema_fast,
            ema_slow,
            adx,
            atr,
            spread_bps,
            bars_seen: self.snapshot.bars_seen + 1,
            regime,
        };

        if regime != previous {
            info!(
                from = %previous,
                to = %regime,
                spread_bps,
                adx,
                ts_ms = bar.timestamp_ms,
                "Regime changed"
            );
        } else {
            debug!(%regime, spread_bps, adx, atr, "Regime updated");
        }

        Ok(regime)
    }

    pub fn is_warm(&self) -> bool {
        self.snapshot.bars_seen >= self.config.warmup_bars()
    }

    /// Current regime. Errors until the classifier is warm.
    pub fn regime(&self) -> RegimeResult<Regime> {
        if !self.is_warm() {
            return Err(RegimeError::NotWarm {
                seen: self.snapshot.bars_seen,
                required: self.config.warmup_bars(),
            });
        }
        Ok(self.snapshot.regime)
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_bar(i: usize, slope: f64) -> Bar {
        let close = 100.0 * (1.0 + slope * i as f64);
        Bar::new(close, close * 1.002, close * 0.998, close, 10.0, i as u64 * 60_000)
    }

    fn falling_bar(i: usize) -> Bar {
        let close = 200.0 * (1.0 - 0.004 * i as f64);
        Bar::new(close, close * 1.002, close * 0.998, close, 10.0, i as u64 * 60_000)
    }

    fn choppy_bar(i: usize) -> Bar {
        let close = if i % 2 == 0 { 100.0 } else { 100.2 };
        Bar::new(close, close + 0.3, close - 0.3, close, 10.0, i as u64 * 60_000)
    }

    #[test]
    fn test_not_warm_until_slow_period_plus_buffer() {
        let mut classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
        for i in 0..35 {
            classifier.update(&choppy_bar(i)).unwrap();
        }
        assert!(matches!(
            classifier.regime(),
            Err(RegimeError::NotWarm { seen: 35, required: 36 })
        ));
        classifier.update(&choppy_bar(35)).unwrap();
        assert_eq!(classifier.regime().unwrap(), Regime::Sideways);
    }

    #[test]
    fn test_uptrend_classified_up() {
        let mut classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
        for i in 0..80 {
            classifier.update(&trending_bar(i, 0.005)).unwrap();
        }
        assert_eq!(classifier.regime().unwrap(), Regime::Up);
        assert!(classifier.snapshot().spread_bps > 30.0);
    }

    #[test]
    fn test_downtrend_classified_down() {
        let mut classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
        for i in 0..80 {
            classifier.update(&falling_bar(i)).unwrap();
        }
        assert_eq!(classifier.regime().unwrap(), Regime::Down);
    }

    #[test]
    fn test_choppy_market_stays_sideways() {
        let mut classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
        for i in 0..80 {
            classifier.update(&choppy_bar(i)).unwrap();
        }
        assert_eq!(classifier.regime().unwrap(), Regime::Sideways);
    }

    #[test]
    fn test_malformed_bar_leaves_state_untouched() {
        let mut classifier = RegimeClassifier::new(RegimeConfig::default()).unwrap();
        for i in 0..10 {
            classifier.update(&trending_bar(i, 0.005)).unwrap();
        }
        let before = classifier.snapshot();

        let inverted = Bar::new(100.0, 99.0, 101.0, 100.0, 1.0, 999);
        assert!(matches!(
            classifier.update(&inverted),
            Err(RegimeError::MalformedBar { ts_ms: 999, .. })
        ));
        let nan = Bar::new(100.0, f64::NAN, 99.0, 100.0, 1.0, 1000);
        assert!(classifier.update(&nan).is_err());

        assert_eq!(classifier.snapshot(), before);

        // Indicators continue from where they were.
        let next = classifier.update(&trending_bar(10, 0.005)).unwrap();
        assert_eq!(classifier.snapshot().bars_seen, 11);
        assert_eq!(next, classifier.snapshot().regime);
    }

    #[test]
    fn test_stalling_trend_holds_inside_band_then_exits_once() {
        let config = RegimeConfig::default();
        let mut classifier = RegimeClassifier::new(config.clone()).unwrap();
        for i in 0..80 {
            classifier.update(&trending_bar(i, 0.005)).unwrap();
        }
        assert_eq!(classifier.regime().unwrap(), Regime::Up);

        // Price stalls: the EMA spread decays through the band between the
        // exit and entry thresholds and then below the exit threshold.
        let top = 100.0 * (1.0 + 0.005 * 79.0);
        let mut held_inside_band = false;
        let mut changes = 0;
        let mut previous = Regime::Up;
        for i in 80..160 {
            let bar = Bar::new(top, top * 1.002, top * 0.998, top, 10.0, i as u64 * 60_000);
            let regime = classifier.update(&bar).unwrap();
            let spread = classifier.snapshot().spread_bps;
            if regime == Regime::Up && spread < config.enter_bps {
                held_inside_band = true;
            }
            if regime != previous {
                changes += 1;
            }
            previous = regime;
        }

        assert!(held_inside_band);
        assert_eq!(changes, 1);
        assert_eq!(classifier.regime().unwrap(), Regime::Sideways);
        assert!(classifier.snapshot().spread_bps < config.exit_bps);
    }

    #[test]
    fn test_hysteresis_oscillation_flips_at_most_once() {
        let config = RegimeConfig::default();
        let mut regime = Regime::Sideways;
        let mut changes = 0;
        // Spread oscillates between just above exit and just above entry.
        for i in 0..200 {
            let spread_bps = if i % 2 == 0 {
                config.enter_bps + 1.0
            } else {
                config.exit_bps + 1.0
            };
            let next = classify(
                regime,
                TrendSignal {
                    spread_bps,
                    adx: config.adx_enter + 5.0,
                },
                &config,
            );
            if next != regime {
                changes += 1;
            }
            regime = next;
        }
        assert_eq!(changes, 1);
        assert_eq!(regime, Regime::Up);
    }

    #[test]
    fn test_oscillation_below_entry_never_enters() {
        let config = RegimeConfig::default();
        let mut regime = Regime::Sideways;
        for i in 0..100 {
            let spread_bps = if i % 2 == 0 {
                config.enter_bps - 1.0
            } else {
                config.exit_bps - 1.0
            };
            regime = classify(
                regime,
                TrendSignal {
                    spread_bps,
                    adx: 40.0,
                },
                &config,
            );
            assert_eq!(regime, Regime::Sideways);
        }
    }

    #[test]
    fn test_trend_exit_and_reversal() {
        let config = RegimeConfig::default();
        let strong = 40.0;

        // Weak ADX drops a trend even with a large spread.
        let next = classify(
            Regime::Up,
            TrendSignal {
                spread_bps: 100.0,
                adx: config.adx_exit - 1.0,
            },
            &config,
        );
        assert_eq!(next, Regime::Sideways);

        // A full reversal goes straight to the opposite trend.
        let next = classify(
            Regime::Up,
            TrendSignal {
                spread_bps: -(config.enter_bps + 5.0),
                adx: strong,
            },
            &config,
        );
        assert_eq!(next, Regime::Down);
    }
}
