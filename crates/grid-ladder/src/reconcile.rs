//! Desired-vs-live reconciliation.
//!
//! For every desired rung, look up the working order at its slot:
//! - no order: Add
//! - order within price and quantity tolerance: nothing
//! - otherwise: Replace
//!
//! Every working grid order whose slot is not desired is cancelled.

use std::collections::HashSet;

use grid_core::{ClientOrderId, LevelKey, LiveOrder, OrderIntent};
use tracing::debug;

use crate::config::ToleranceConfig;
use crate::ladder::Rung;
use crate::live_orders::LiveOrderTable;
use crate::precision::QuantizedLadders;

/// A live order to move onto a desired rung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReplace {
    pub cloid: ClientOrderId,
    pub rung: Rung,
}

/// Minimal operation set moving live state to the desired ladders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub cancels: Vec<ClientOrderId>,
    pub replaces: Vec<PlannedReplace>,
    pub adds: Vec<Rung>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.cancels.is_empty() && self.replaces.is_empty() && self.adds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cancels.len() + self.replaces.len() + self.adds.len()
    }

    /// Intents in execution order: cancels, then replaces, then adds.
    pub fn into_intents(self) -> Vec<OrderIntent> {
        let mut intents = Vec::with_capacity(self.len());
        intents.extend(
            self.cancels
                .into_iter()
                .map(|cloid| OrderIntent::Cancel { cloid }),
        );
        intents.extend(self.replaces.into_iter().map(|r| OrderIntent::Replace {
            cloid: r.cloid,
            price: r.rung.price,
            qty: r.rung.qty,
        }));
        intents.extend(self.adds.into_iter().map(|rung| OrderIntent::Add {
            side: rung.side,
            level: rung.level,
            price: rung.price,
            qty: rung.qty,
        }));
        intents
    }
}

/// Compute the operations needed to converge `live` onto `desired`.
pub fn diff(
    desired: &QuantizedLadders,
    live: &LiveOrderTable,
    tolerance: &ToleranceConfig,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut wanted: HashSet<LevelKey> = HashSet::with_capacity(desired.len());

    for rung in desired.iter() {
        let key = rung.key();
        wanted.insert(key);
        match live.at_slot(&key) {
            None => plan.adds.push(*rung),
            Some(order) if within_tolerance(order, rung, tolerance) => {}
            Some(order) => plan.replaces.push(PlannedReplace {
                cloid: order.cloid.clone(),
                rung: *rung,
            }),
        }
    }

    for (key, order) in live.slotted() {
        if !wanted.contains(key) {
            plan.cancels.push(order.cloid.clone());
        }
    }

    if !plan.is_empty() {
        debug!(
            adds = plan.adds.len(),
            replaces = plan.replaces.len(),
            cancels = plan.cancels.len(),
            "Reconcile plan"
        );
    }
    plan
}

fn within_tolerance(order: &LiveOrder, rung: &Rung, tolerance: &ToleranceConfig) -> bool {
    let price_ok = order
        .price
        .abs_bps_from(rung.price)
        .is_some_and(|bps| bps <= tolerance.price_tolerance_bps);
    let qty_ok = order
        .qty
        .pct_from(rung.qty)
        .map(|pct| pct.abs())
        .is_some_and(|pct| pct <= tolerance.qty_tolerance_pct);
    price_ok && qty_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::config::LadderConfig;
    use crate::ladder::Ladders;
    use crate::precision::quantize;
    use grid_core::{InstrumentSpec, NewOrder, PositionSide, Price, Size};
    use grid_regime::Regime;
    use rust_decimal_macros::dec;

    fn instrument() -> InstrumentSpec {
        InstrumentSpec::new(
            "BTCUSDT",
            Price::new(dec!(0.1)),
            Size::new(dec!(0.001)),
            dec!(10),
        )
    }

    fn tolerance() -> ToleranceConfig {
        ToleranceConfig {
            price_tolerance_bps: dec!(5),
            qty_tolerance_pct: dec!(5),
        }
    }

    fn desired_at(center: Price, levels: u32) -> QuantizedLadders {
        let config = LadderConfig {
            levels_long: levels,
            levels_short: levels,
            base_qty: dec!(0.01),
            ..Default::default()
        };
        quantize(build(center, &config, Regime::Sideways), &instrument())
    }

    /// Place every desired rung into a fresh table, as the pipeline would.
    fn live_matching(desired: &QuantizedLadders) -> LiveOrderTable {
        let mut table = LiveOrderTable::new();
        for (i, rung) in desired.iter().enumerate() {
            let order = NewOrder::grid(
                ClientOrderId::from(format!("live-{i}")),
                rung.key(),
                rung.price,
                rung.qty,
                0,
            );
            table.insert_pending(&order).unwrap();
            table.on_accepted(&order.cloid, 1);
        }
        table
    }

    #[test]
    fn test_empty_table_adds_everything() {
        let desired = desired_at(Price::new(dec!(50000)), 3);
        let plan = diff(&desired, &LiveOrderTable::new(), &tolerance());
        assert_eq!(plan.adds.len(), 6);
        assert!(plan.cancels.is_empty());
        assert!(plan.replaces.is_empty());
    }

    #[test]
    fn test_matching_live_state_is_idempotent() {
        let desired = desired_at(Price::new(dec!(50000)), 4);
        let live = live_matching(&desired);
        let plan = diff(&desired, &live, &tolerance());
        assert!(plan.is_empty(), "{plan:?}");
    }

    #[test]
    fn test_small_perturbation_is_churn_free() {
        let live = live_matching(&desired_at(Price::new(dec!(50000)), 4));
        // 2 bps move, inside the 5 bps price tolerance
        let desired = desired_at(Price::new(dec!(50010)), 4);
        let plan = diff(&desired, &live, &tolerance());
        assert!(plan.replaces.is_empty());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_large_move_replaces_every_rung() {
        let live = live_matching(&desired_at(Price::new(dec!(50000)), 2));
        // 20 bps move
        let desired = desired_at(Price::new(dec!(50100)), 2);
        let plan = diff(&desired, &live, &tolerance());
        assert_eq!(plan.replaces.len(), 4);
        assert!(plan.adds.is_empty());
        assert!(plan.cancels.is_empty());
    }

    #[test]
    fn test_quantity_drift_replaces() {
        let desired = desired_at(Price::new(dec!(50000)), 1);
        let mut ladders: Ladders = desired.clone().into_ladders();
        for rung in ladders.long.rungs_mut() {
            rung.qty = Size::new(dec!(0.02));
        }
        let live = live_matching(&quantize(ladders, &instrument()));
        let plan = diff(&desired, &live, &tolerance());
        assert_eq!(plan.replaces.len(), 1);
        assert_eq!(plan.replaces[0].rung.side, PositionSide::Long);
    }

    #[test]
    fn test_undesired_slots_cancelled() {
        let live = live_matching(&desired_at(Price::new(dec!(50000)), 4));
        let desired = desired_at(Price::new(dec!(50000)), 2);
        let plan = diff(&desired, &live, &tolerance());
        assert_eq!(plan.cancels.len(), 4);
        assert!(plan.adds.is_empty());
        assert!(plan.replaces.is_empty());
    }

    #[test]
    fn test_cancel_requested_orders_do_not_block_slot() {
        let desired = desired_at(Price::new(dec!(50000)), 1);
        let mut live = live_matching(&desired);
        let ids: Vec<_> = live.iter().map(|o| o.cloid.clone()).collect();
        for id in &ids {
            live.mark_cancel_requested(id, 2);
        }
        let plan = diff(&desired, &live, &tolerance());
        assert_eq!(plan.adds.len(), 2);
        assert!(plan.cancels.is_empty());
    }

    #[test]
    fn test_intents_ordered_cancel_replace_add() {
        let live = live_matching(&desired_at(Price::new(dec!(50000)), 3));
        // Move far enough to replace, and shrink the SHORT side to cancel.
        let mut ladders = desired_at(Price::new(dec!(50200)), 4).into_ladders();
        ladders.short.truncate(1);
        let desired = quantize(ladders, &instrument());
        let intents = diff(&desired, &live, &tolerance()).into_intents();

        let rank = |i: &OrderIntent| match i {
            OrderIntent::Cancel { .. } => 0,
            OrderIntent::Replace { .. } => 1,
            OrderIntent::Add { .. } => 2,
        };
        let ranks: Vec<_> = intents.iter().map(rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        assert!(ranks.contains(&0) && ranks.contains(&1) && ranks.contains(&2));
    }
}
