//! Per-side position cap applied to candidate grid adds.

use grid_core::{PositionSide, Price, Size};
use rust_decimal::Decimal;
use tracing::debug;

/// Caps each side's resulting notional at `max_position_fraction × balance`.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizeGate {
    max_position_fraction: Decimal,
}

impl PositionSizeGate {
    pub fn new(max_position_fraction: Decimal) -> Self {
        Self {
            max_position_fraction,
        }
    }

    pub fn max_position_fraction(&self) -> Decimal {
        self.max_position_fraction
    }

    pub fn limit(&self, balance: Decimal) -> Decimal {
        (self.max_position_fraction * balance).max(Decimal::ZERO)
    }

    /// Start a budget for one update cycle from the current filled positions.
    pub fn budget(&self, balance: Decimal, long_filled: Size, short_filled: Size) -> PositionBudget {
        PositionBudget {
            limit: self.limit(balance),
            long: SideBudget::new(long_filled),
            short: SideBudget::new(short_filled),
            rejected: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SideBudget {
    filled: Size,
    approved: Size,
}

impl SideBudget {
    fn new(filled: Size) -> Self {
        Self {
            filled: filled.non_negative(),
            approved: Size::ZERO,
        }
    }
}

/// Running approval state for one cycle's adds.
#[derive(Debug, Clone)]
pub struct PositionBudget {
    limit: Decimal,
    long: SideBudget,
    short: SideBudget,
    rejected: usize,
}

impl PositionBudget {
    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn approved(&self, side: PositionSide) -> Size {
        self.side(side).approved
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Approve `qty` on `side` if (filled + approved + qty) × price stays
    /// within the limit. Approved quantity counts against later candidates.
    pub fn try_approve(&mut self, side: PositionSide, qty: Size, price: Price) -> bool {
        let limit = self.limit;
        let budget = self.side_mut(side);
        let resulting = (budget.filled + budget.approved + qty).notional(price);
        if resulting > limit {
            debug!(
                %side,
                %qty,
                %price,
                %resulting,
                %limit,
                "Add rejected by position-size gate"
            );
            self.rejected += 1;
            return false;
        }
        budget.approved = budget.approved + qty;
        true
    }

    fn side(&self, side: PositionSide) -> &SideBudget {
        match side {
            PositionSide::Long => &self.long,
            PositionSide::Short => &self.short,
        }
    }

    fn side_mut(&mut self, side: PositionSide) -> &mut SideBudget {
        match side {
            PositionSide::Long => &mut self.long,
            PositionSide::Short => &mut self.short,
        }
    }
}
