//! Hedge-mode position book built from fills.
//!
//! Grid fills open exposure on their position side; reduce-only exit
//! fills close it and realize PnL against the average entry.

use grid_core::{PositionSide, Price, Size};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// One leg of a hedge-mode position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SidePosition {
    pub qty: Size,
    /// Volume-weighted entry price. Zero when flat.
    pub avg_entry: Price,
}

impl SidePosition {
    pub fn is_flat(&self) -> bool {
        !self.qty.is_positive()
    }

    pub fn notional(&self) -> Decimal {
        self.qty.notional(self.avg_entry)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    long: SidePosition,
    short: SidePosition,
    realized_pnl: Decimal,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side(&self, side: PositionSide) -> &SidePosition {
        match side {
            PositionSide::Long => &self.long,
            PositionSide::Short => &self.short,
        }
    }

    pub fn qty(&self, side: PositionSide) -> Size {
        self.side(side).qty
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Add an entry fill to its leg and update the average entry.
    pub fn on_entry_fill(&mut self, side: PositionSide, price: Price, qty: Size) {
        if !qty.is_positive() {
            return;
        }
        let leg = self.side_mut(side);
        let total = leg.qty + qty;
        let cost = leg.qty.notional(leg.avg_entry) + qty.notional(price);
        leg.avg_entry = Price::new(cost / total.inner());
        leg.qty = total;
        debug!(%side, qty = %leg.qty, avg_entry = %leg.avg_entry, "Position increased");
    }

    /// Close part of a leg. Returns the PnL realized by this fill.
    ///
    /// Fills larger than the open quantity are clamped to it.
    pub fn on_exit_fill(&mut self, side: PositionSide, price: Price, qty: Size) -> Decimal {
        let leg = self.side_mut(side);
        let closed = qty.min(leg.qty);
        if closed < qty {
            warn!(%side, %qty, open = %leg.qty, "Exit fill exceeds open position, clamping");
        }
        if !closed.is_positive() {
            return Decimal::ZERO;
        }

        let per_unit = match side {
            PositionSide::Long => price.inner() - leg.avg_entry.inner(),
            PositionSide::Short => leg.avg_entry.inner() - price.inner(),
        };
        let pnl = per_unit * closed.inner();

        leg.qty = leg.qty - closed;
        if leg.is_flat() {
            leg.avg_entry = Price::ZERO;
        }
        self.realized_pnl += pnl;
        debug!(%side, %closed, %pnl, "Position reduced");
        pnl
    }

    fn side_mut(&mut self, side: PositionSide) -> &mut SidePosition {
        match side {
            PositionSide::Long => &mut self.long,
            PositionSide::Short => &mut self.short,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_average_entry() {
        let mut book = PositionBook::new();
        book.on_entry_fill(PositionSide::Long, Price::new(dec!(100)), Size::new(dec!(1)));
        book.on_entry_fill(PositionSide::Long, Price::new(dec!(90)), Size::new(dec!(1)));
        let long = book.side(PositionSide::Long);
        assert_eq!(long.qty, Size::new(dec!(2)));
        assert_eq!(long.avg_entry, Price::new(dec!(95)));
        assert!(book.side(PositionSide::Short).is_flat());
    }

    #[test]
    fn test_long_take_profit_realizes_gain() {
        let mut book = PositionBook::new();
        book.on_entry_fill(PositionSide::Long, Price::new(dec!(49750)), Size::new(dec!(0.01)));
        let pnl = book.on_exit_fill(PositionSide::Long, Price::new(dec!(50000)), Size::new(dec!(0.01)));
        assert_eq!(pnl, dec!(2.5));
        assert!(book.side(PositionSide::Long).is_flat());
        assert_eq!(book.side(PositionSide::Long).avg_entry, Price::ZERO);
    }

    #[test]
    fn test_short_stop_loss_realizes_loss() {
        let mut book = PositionBook::new();
        book.on_entry_fill(PositionSide::Short, Price::new(dec!(100)), Size::new(dec!(2)));
        let pnl = book.on_exit_fill(PositionSide::Short, Price::new(dec!(103)), Size::new(dec!(1)));
        assert_eq!(pnl, dec!(-3));
        assert_eq!(book.qty(PositionSide::Short), Size::new(dec!(1)));
        assert_eq!(book.realized_pnl(), dec!(-3));
    }

    #[test]
    fn test_exit_clamped_to_open_qty() {
        let mut book = PositionBook::new();
        book.on_entry_fill(PositionSide::Long, Price::new(dec!(10)), Size::new(dec!(1)));
        let pnl = book.on_exit_fill(PositionSide::Long, Price::new(dec!(11)), Size::new(dec!(5)));
        assert_eq!(pnl, dec!(1));
        assert_eq!(book.on_exit_fill(PositionSide::Long, Price::new(dec!(11)), Size::new(dec!(1))), Decimal::ZERO);
    }
}
