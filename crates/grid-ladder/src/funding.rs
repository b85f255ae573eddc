//! Funding-cost guard.
//!
//! Keeps a rolling window of funding-rate samples and, when the projected
//! cost of holding the paying side over the configured horizon exceeds
//! `max_cost_bps`, scales that side's quantities down proportionally.

use std::collections::VecDeque;

use grid_core::{FundingSample, PositionSide};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::FundingConfig;
use crate::ladder::Ladders;

const BPS: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Projected funding cost from the most recent rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingProjection {
    /// Most recent rate (per funding interval).
    pub rate: Decimal,
    /// |rate| × (horizon / interval) in bps of notional.
    pub projected_bps: Decimal,
    /// Side that pays: LONG for a positive rate, SHORT for a negative one.
    pub paying_side: Option<PositionSide>,
}

impl FundingProjection {
    /// Quantity multiplier for the paying side, in [0, 1].
    pub fn scale(&self, max_cost_bps: Decimal) -> Decimal {
        if self.paying_side.is_none() || self.projected_bps <= max_cost_bps {
            return Decimal::ONE;
        }
        (max_cost_bps / self.projected_bps).clamp(Decimal::ZERO, Decimal::ONE)
    }
}

/// Stateful funding guard. One per instrument.
#[derive(Debug, Clone)]
pub struct FundingGuard {
    config: FundingConfig,
    /// Samples ordered by timestamp, oldest first.
    window: VecDeque<FundingSample>,
}

impl FundingGuard {
    pub fn new(config: FundingConfig) -> Self {
        Self {
            config,
            window: VecDeque::new(),
        }
    }

    /// Insert a sample in timestamp order and evict stale entries.
    pub fn record(&mut self, sample: FundingSample) {
        let idx = self.window.partition_point(|s| s.ts_ms <= sample.ts_ms);
        self.window.insert(idx, sample);
        let newest = self.window.back().map_or(sample.ts_ms, |s| s.ts_ms);
        self.evict(newest);
        debug!(
            ts_ms = sample.ts_ms,
            rate = %sample.rate,
            samples = self.window.len(),
            "Funding sample recorded"
        );
    }

    /// Drop samples older than `now - window_ms`.
    pub fn evict(&mut self, now_ms: u64) {
        let cutoff = now_ms.saturating_sub(self.config.window_ms);
        while self.window.front().is_some_and(|s| s.ts_ms < cutoff) {
            self.window.pop_front();
        }
    }

    pub fn latest(&self) -> Option<FundingSample> {
        self.window.back().copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn projection(&self) -> Option<FundingProjection> {
        let latest = self.latest()?;
        let periods = Decimal::from(self.config.horizon_ms)
            / Decimal::from(self.config.funding_interval_ms.max(1));
        let paying_side = if latest.rate > Decimal::ZERO {
            Some(PositionSide::Long)
        } else if latest.rate < Decimal::ZERO {
            Some(PositionSide::Short)
        } else {
            None
        };
        Some(FundingProjection {
            rate: latest.rate,
            projected_bps: latest.rate.abs() * periods * BPS,
            paying_side,
        })
    }

    /// Scale the paying side when the projected cost is above the threshold.
    pub fn adjust(&mut self, mut ladders: Ladders, now_ms: u64) -> Ladders {
        self.evict(now_ms);
        let Some(projection) = self.projection() else {
            return ladders;
        };
        let Some(side) = projection.paying_side else {
            return ladders;
        };

        let scale = projection.scale(self.config.max_cost_bps);
        if scale >= Decimal::ONE {
            return ladders;
        }

        let ladder = ladders.side_mut(side);
        let notional = ladder.total_notional();
        warn!(
            %side,
            rate = %projection.rate,
            projected_bps = %projection.projected_bps,
            max_cost_bps = %self.config.max_cost_bps,
            projected_quote_cost = %(notional * projection.projected_bps / BPS),
            %scale,
            "Funding cost above threshold, scaling paying side"
        );
        for rung in ladder.rungs_mut() {
            rung.qty = (rung.qty * scale).non_negative();
        }
        ladders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::config::LadderConfig;
    use grid_core::Price;
    use grid_regime::Regime;
    use rust_decimal_macros::dec;

    const HOUR: u64 = 3_600_000;

    fn ladders() -> Ladders {
        build(
            Price::new(dec!(50000)),
            &LadderConfig::default(),
            Regime::Sideways,
        )
    }

    fn guard() -> FundingGuard {
        FundingGuard::new(FundingConfig {
            window_ms: 24 * HOUR,
            horizon_ms: 8 * HOUR,
            funding_interval_ms: 8 * HOUR,
            max_cost_bps: dec!(5),
        })
    }

    #[test]
    fn test_empty_window_is_noop() {
        let mut guard = guard();
        let original = ladders();
        assert_eq!(guard.adjust(original.clone(), 0), original);
    }

    #[test]
    fn test_cheap_funding_is_noop() {
        let mut guard = guard();
        guard.record(FundingSample::new(HOUR, dec!(0.0001))); // 1 bp
        let original = ladders();
        assert_eq!(guard.adjust(original.clone(), 2 * HOUR), original);
    }

    #[test]
    fn test_positive_rate_scales_long_side() {
        let mut guard = guard();
        guard.record(FundingSample::new(HOUR, dec!(0.001))); // 10 bps per interval
        let original = ladders();
        let adjusted = guard.adjust(original.clone(), 2 * HOUR);

        assert_eq!(adjusted.short, original.short);
        for (a, o) in adjusted.long.iter().zip(original.long.iter()) {
            assert_eq!(a.qty.inner(), o.qty.inner() * dec!(0.5));
            assert_eq!(a.price, o.price);
        }
    }

    #[test]
    fn test_negative_rate_scales_short_side() {
        let mut guard = guard();
        guard.record(FundingSample::new(HOUR, dec!(-0.002))); // 20 bps
        let original = ladders();
        let adjusted = guard.adjust(original.clone(), 2 * HOUR);

        assert_eq!(adjusted.long, original.long);
        let first = adjusted.short.rungs()[0].qty.inner();
        assert_eq!(first, dec!(0.01) * dec!(0.25));
    }

    #[test]
    fn test_out_of_order_samples_use_latest_timestamp() {
        let mut guard = guard();
        guard.record(FundingSample::new(3 * HOUR, dec!(0.0001)));
        guard.record(FundingSample::new(HOUR, dec!(0.01)));
        assert_eq!(guard.latest().unwrap().rate, dec!(0.0001));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn test_stale_samples_evicted() {
        let mut guard = guard();
        guard.record(FundingSample::new(HOUR, dec!(0.01)));
        let original = ladders();
        let adjusted = guard.adjust(original.clone(), 30 * HOUR);
        assert!(guard.is_empty());
        assert_eq!(adjusted, original);
    }

    #[test]
    fn test_projection_over_longer_horizon() {
        let mut guard = FundingGuard::new(FundingConfig {
            horizon_ms: 24 * HOUR,
            ..FundingConfig::default()
        });
        guard.record(FundingSample::new(0, dec!(0.0001)));
        let projection = guard.projection().unwrap();
        assert_eq!(projection.projected_bps, dec!(3));
        assert_eq!(projection.paying_side, Some(PositionSide::Long));
        assert_eq!(projection.scale(dec!(5)), Decimal::ONE);
    }

    #[test]
    fn test_identical_window_is_deterministic() {
        let mut a = guard();
        let mut b = guard();
        for g in [&mut a, &mut b] {
            g.record(FundingSample::new(HOUR, dec!(0.0004)));
            g.record(FundingSample::new(2 * HOUR, dec!(0.0009)));
        }
        assert_eq!(a.adjust(ladders(), 3 * HOUR), b.adjust(ladders(), 3 * HOUR));
    }
}
