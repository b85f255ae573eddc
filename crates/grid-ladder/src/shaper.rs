//! Regime-aware ladder shaping.

use grid_core::PositionSide;
use grid_regime::Regime;

use crate::config::ShaperConfig;
use crate::ladder::Ladders;

/// Ladder that trades against the trend in `regime`, if any.
///
/// In an UP trend the SHORT ladder sells into strength; in a DOWN trend the
/// LONG ladder buys into weakness.
pub fn counter_trend_side(regime: Regime) -> Option<PositionSide> {
    match regime {
        Regime::Up => Some(PositionSide::Short),
        Regime::Down => Some(PositionSide::Long),
        Regime::Sideways => None,
    }
}

/// Throttle the counter-trend ladder: keep the nearest `counter_levels`
/// rungs and scale their quantity by `counter_qty_scale`.
pub fn shape(mut ladders: Ladders, regime: Regime, config: &ShaperConfig) -> Ladders {
    ladders.regime = regime;
    let Some(side) = counter_trend_side(regime) else {
        return ladders;
    };

    let ladder = ladders.side_mut(side);
    ladder.truncate(config.counter_levels as usize);
    for rung in ladder.rungs_mut() {
        rung.qty = rung.qty * config.counter_qty_scale;
    }
    ladders
}
