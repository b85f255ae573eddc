//! Rungs and ladders.

use grid_core::{LevelKey, PositionSide, Price, Size};
use grid_regime::Regime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single grid level's price and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rung {
    pub side: PositionSide,
    /// Distance from the center in rungs, 0 = nearest.
    pub level: u32,
    pub price: Price,
    pub qty: Size,
}

impl Rung {
    pub fn key(&self) -> LevelKey {
        LevelKey::new(self.side, self.level)
    }

    pub fn notional(&self) -> Decimal {
        self.qty.notional(self.price)
    }
}

/// Rungs sharing one side, ordered by level (nearest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    side: PositionSide,
    rungs: Vec<Rung>,
}

impl Ladder {
    pub fn new(side: PositionSide) -> Self {
        Self {
            side,
            rungs: Vec::new(),
        }
    }

    pub fn side(&self) -> PositionSide {
        self.side
    }

    pub fn push(&mut self, rung: Rung) {
        self.rungs.push(rung);
    }

    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rung> {
        self.rungs.iter()
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    pub fn total_notional(&self) -> Decimal {
        self.rungs.iter().map(Rung::notional).sum()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.rungs.truncate(len);
    }

    pub(crate) fn rungs_mut(&mut self) -> &mut Vec<Rung> {
        &mut self.rungs
    }
}

/// The LONG and SHORT ladders for one update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladders {
    pub long: Ladder,
    pub short: Ladder,
    /// Regime the ladders were built under.
    pub regime: Regime,
}

impl Ladders {
    pub fn empty(regime: Regime) -> Self {
        Self {
            long: Ladder::new(PositionSide::Long),
            short: Ladder::new(PositionSide::Short),
            regime,
        }
    }

    pub fn side(&self, side: PositionSide) -> &Ladder {
        match side {
            PositionSide::Long => &self.long,
            PositionSide::Short => &self.short,
        }
    }

    pub fn side_mut(&mut self, side: PositionSide) -> &mut Ladder {
        match side {
            PositionSide::Long => &mut self.long,
            PositionSide::Short => &mut self.short,
        }
    }

    /// All rungs, LONG first.
    pub fn iter(&self) -> impl Iterator<Item = &Rung> {
        self.long.iter().chain(self.short.iter())
    }

    pub fn len(&self) -> usize {
        self.long.len() + self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty() && self.short.is_empty()
    }
}
