//! Take-profit and stop-loss orders for grid fills.

use grid_core::{
    InstrumentSpec, NewOrder, OrderIdGenerator, OrderKind, PositionSide, Price, Size,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::ExitConfig;

/// Derives the reduce-only exit pair for each grid fill.
///
/// Take-profit rests `tp_steps` grid steps from the fill on the favorable
/// side; stop-loss triggers `sl_steps` steps away on the unfavorable side.
/// Both carry the filled order's position side and skip the
/// minimum-notional filter.
#[derive(Debug, Clone)]
pub struct ExitPlanner {
    config: ExitConfig,
    step_bps: Decimal,
}

impl ExitPlanner {
    pub fn new(config: ExitConfig, step_bps: Decimal) -> Self {
        Self { config, step_bps }
    }

    /// Build `[take_profit, stop_loss]` for a fill, or nothing when disabled
    /// or when the fill quantity floors to zero.
    pub fn plan(
        &self,
        position_side: PositionSide,
        fill_price: Price,
        fill_qty: Size,
        instrument: &InstrumentSpec,
        ids: &OrderIdGenerator,
        event_ts_ms: u64,
    ) -> Vec<NewOrder> {
        if !self.config.enabled {
            return Vec::new();
        }
        let qty = instrument.round_qty(fill_qty);
        if !qty.is_positive() {
            debug!(%position_side, %fill_qty, "Fill too small for exits");
            return Vec::new();
        }

        let favorable = match position_side {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        };
        let exit_side = position_side.exit_side();
        let tp_price = instrument.round_price_passive(
            fill_price.offset_bps(favorable * self.config.tp_steps * self.step_bps),
            exit_side,
        );
        let sl_price = instrument.round_price_passive(
            fill_price.offset_bps(-favorable * self.config.sl_steps * self.step_bps),
            exit_side,
        );

        let mut exits = Vec::with_capacity(2);
        for (kind, price) in [
            (OrderKind::TakeProfit, tp_price),
            (OrderKind::StopLoss, sl_price),
        ] {
            if price.is_positive() {
                exits.push(NewOrder::exit(
                    ids.next(event_ts_ms),
                    position_side,
                    kind,
                    price,
                    qty,
                    event_ts_ms,
                ));
            }
        }
        debug!(
            %position_side,
            %fill_price,
            %qty,
            tp = %tp_price,
            sl = %sl_price,
            "Exit orders planned"
        );
        exits
    }
}
