//! Ladder construction.
//!
//! Rung `k` (0 = nearest) sits `k + 1` steps from the center, so no order
//! ever rests at the center itself:
//!
//! ```text
//! LONG  price = center × (1 − (k + 1) × step_bps / 10000)
//! SHORT price = center × (1 + (k + 1) × step_bps / 10000)
//! qty         = base_qty × qty_scale^k
//! ```

use grid_core::{PositionSide, Price, Size};
use grid_regime::Regime;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::LadderConfig;
use crate::ladder::{Ladder, Ladders, Rung};

/// Build both ladders around `reference`.
pub fn build(reference: Price, config: &LadderConfig, regime: Regime) -> Ladders {
    let ladders = Ladders {
        long: build_side(reference, config, PositionSide::Long, config.levels_long),
        short: build_side(reference, config, PositionSide::Short, config.levels_short),
        regime,
    };
    debug!(
        center = %reference,
        %regime,
        long = ladders.long.len(),
        short = ladders.short.len(),
        "Ladders built"
    );
    ladders
}

fn build_side(reference: Price, config: &LadderConfig, side: PositionSide, levels: u32) -> Ladder {
    let direction = match side {
        PositionSide::Long => -Decimal::ONE,
        PositionSide::Short => Decimal::ONE,
    };
    let mut ladder = Ladder::new(side);
    let mut qty = config.base_qty;
    for level in 0..levels {
        let steps = Decimal::from(level + 1);
        ladder.push(Rung {
            side,
            level,
            price: reference.offset_bps(direction * steps * config.step_bps),
            qty: Size::new(qty),
        });
        qty *= config.qty_scale;
    }
    ladder
}

/// Sticky grid center.
///
/// Seeded by the first mid and replaced only when the mid moves more than
/// `recenter_trigger_bps` away from it.
#[derive(Debug, Clone, Default)]
pub struct GridCenter {
    center: Option<Price>,
    recenters: u64,
}

impl GridCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Price> {
        self.center
    }

    /// Number of times the center moved after seeding.
    pub fn recenters(&self) -> u64 {
        self.recenters
    }

    /// Fold in the latest mid and return the center to build around.
    pub fn update(&mut self, mid: Price, config: &LadderConfig) -> Price {
        let Some(center) = self.center else {
            info!(center = %mid, "Grid center seeded");
            self.center = Some(mid);
            return mid;
        };

        match mid.abs_bps_from(center) {
            Some(moved_bps) if moved_bps > config.recenter_trigger_bps => {
                info!(
                    from = %center,
                    to = %mid,
                    %moved_bps,
                    "Grid re-centered"
                );
                self.center = Some(mid);
                self.recenters += 1;
                mid
            }
            _ => center,
        }
    }

    pub fn reset(&mut self) {
        self.center = None;
    }
}
