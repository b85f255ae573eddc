//! Live-order table.
//!
//! Owns every order the strategy has emitted and not yet seen finish.
//! Orders are keyed by client order ID. Grid orders additionally occupy a
//! `(PositionSide, level)` slot while they are pending or accepted; an order
//! leaves its slot as soon as a cancel or replace is requested for it, so
//! the slot can be refilled without waiting for the cancel confirmation.
//!
//! The take-profit and stop-loss placed for one fill are linked as
//! siblings. When one leg leaves the table for good, the link is dropped
//! and the other leg's ID is handed back so the caller can cancel it.

use std::collections::{BTreeMap, HashMap};

use grid_core::{ClientOrderId, LevelKey, LiveOrder, NewOrder, OrderState, Price, Size};
use tracing::{debug, warn};

use crate::error::{LadderError, LadderResult};

/// Result of applying a fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillUpdate {
    /// Order state after the fill (removed from the table if final).
    pub order: LiveOrder,
    pub fill_price: Price,
    pub fill_qty: Size,
    pub is_final: bool,
    /// Linked exit leg still in the table, set only on a final fill.
    pub sibling: Option<ClientOrderId>,
}

/// An order removed from the table in a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedOrder {
    pub order: LiveOrder,
    /// Linked exit leg still in the table.
    pub sibling: Option<ClientOrderId>,
}

#[derive(Debug, Default)]
pub struct LiveOrderTable {
    orders: HashMap<ClientOrderId, LiveOrder>,
    slots: BTreeMap<LevelKey, ClientOrderId>,
    siblings: HashMap<ClientOrderId, ClientOrderId>,
}

impl LiveOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a just-emitted order as `Pending`.
    pub fn insert_pending(&mut self, order: &NewOrder) -> LadderResult<()> {
        if self.orders.contains_key(&order.cloid) {
            return Err(LadderError::DuplicateOrderId(order.cloid.clone()));
        }
        if let Some(key) = order.key() {
            if let Some(existing) = self.slots.get(&key) {
                return Err(LadderError::InvariantViolation(format!(
                    "slot {key} already held by {existing}, cannot add {}",
                    order.cloid
                )));
            }
            self.slots.insert(key, order.cloid.clone());
        }
        self.orders
            .insert(order.cloid.clone(), LiveOrder::from_new(order));
        Ok(())
    }

    pub fn get(&self, cloid: &ClientOrderId) -> Option<&LiveOrder> {
        self.orders.get(cloid)
    }

    pub fn contains(&self, cloid: &ClientOrderId) -> bool {
        self.orders.contains_key(cloid)
    }

    /// Working grid order occupying `key`.
    pub fn at_slot(&self, key: &LevelKey) -> Option<&LiveOrder> {
        self.slots.get(key).and_then(|cloid| self.orders.get(cloid))
    }

    /// Working grid orders in slot order (LONG before SHORT, level ascending).
    pub fn slotted(&self) -> impl Iterator<Item = (&LevelKey, &LiveOrder)> {
        self.slots
            .iter()
            .filter_map(|(key, cloid)| self.orders.get(cloid).map(|order| (key, order)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LiveOrder> {
        self.orders.values()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Link two exit legs so that finishing one surfaces the other.
    pub fn link_exits(&mut self, a: &ClientOrderId, b: &ClientOrderId) -> LadderResult<()> {
        if !self.orders.contains_key(a) || !self.orders.contains_key(b) || a == b {
            return Err(LadderError::InvariantViolation(format!(
                "cannot link exits {a} and {b}"
            )));
        }
        self.siblings.insert(a.clone(), b.clone());
        self.siblings.insert(b.clone(), a.clone());
        Ok(())
    }

    pub fn sibling_of(&self, cloid: &ClientOrderId) -> Option<&ClientOrderId> {
        self.siblings.get(cloid)
    }

    pub fn linked_count(&self) -> usize {
        self.siblings.len()
    }

    /// Promote a pending order once the venue accepts it.
    pub fn on_accepted(&mut self, cloid: &ClientOrderId, ts_ms: u64) -> Option<&LiveOrder> {
        let order = self.orders.get_mut(cloid)?;
        if order.state == OrderState::Pending {
            order.state = OrderState::Accepted;
        }
        order.updated_at_ms = ts_ms;
        Some(&*order)
    }

    /// Mark an order as cancel-requested and release its slot.
    pub fn mark_cancel_requested(&mut self, cloid: &ClientOrderId, ts_ms: u64) -> bool {
        let Some(order) = self.orders.get_mut(cloid) else {
            return false;
        };
        order.state = OrderState::CancelRequested;
        order.updated_at_ms = ts_ms;
        if let Some(key) = order.key() {
            self.release_slot(&key, cloid);
        }
        true
    }

    /// Apply a (possibly partial) fill.
    pub fn on_fill(
        &mut self,
        cloid: &ClientOrderId,
        fill_price: Price,
        fill_qty: Size,
        ts_ms: u64,
    ) -> Option<FillUpdate> {
        let order = self.orders.get_mut(cloid)?;
        order.filled_qty = order.filled_qty + fill_qty;
        order.updated_at_ms = ts_ms;
        if order.state == OrderState::Pending {
            order.state = OrderState::Accepted;
        }

        if !order.is_fully_filled() {
            return Some(FillUpdate {
                order: order.clone(),
                fill_price,
                fill_qty,
                is_final: false,
                sibling: None,
            });
        }

        let FinishedOrder { mut order, sibling } = self.remove(cloid)?;
        order.state = OrderState::Filled;
        debug!(%cloid, %fill_price, %fill_qty, "Order fully filled");
        Some(FillUpdate {
            order,
            fill_price,
            fill_qty,
            is_final: true,
            sibling,
        })
    }

    /// Remove an order that reached a terminal state.
    pub fn finish(
        &mut self,
        cloid: &ClientOrderId,
        state: OrderState,
        ts_ms: u64,
    ) -> Option<FinishedOrder> {
        if !state.is_terminal() {
            warn!(%cloid, ?state, "finish() called with non-terminal state");
        }
        let mut finished = self.remove(cloid)?;
        finished.order.state = state;
        finished.order.updated_at_ms = ts_ms;
        Some(finished)
    }

    fn remove(&mut self, cloid: &ClientOrderId) -> Option<FinishedOrder> {
        let order = self.orders.remove(cloid)?;
        if let Some(key) = order.key() {
            self.release_slot(&key, cloid);
        }
        let mut sibling = self.siblings.remove(cloid);
        if let Some(other) = &sibling {
            self.siblings.remove(other);
            if !self.orders.contains_key(other) {
                sibling = None;
            }
        }
        Some(FinishedOrder { order, sibling })
    }

    fn release_slot(&mut self, key: &LevelKey, cloid: &ClientOrderId) {
        if self.slots.get(key) == Some(cloid) {
            self.slots.remove(key);
        }
    }
}
