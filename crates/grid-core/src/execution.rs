//! Execution-related types for order lifecycle management.
//!
//! This module provides types for:
//! - Reconciler intents and the concrete commands sent to the host
//! - Order lifecycle events reported back by the host
//! - Live order tracking state

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::{ClientOrderId, OrderKind, OrderSide, PositionSide};
use crate::{Price, Size};

// ============================================================================
// Intents and Commands
// ============================================================================

/// Grid slot: one (position side, level) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelKey {
    pub side: PositionSide,
    pub level: u32,
}

impl LevelKey {
    pub fn new(side: PositionSide, level: u32) -> Self {
        Self { side, level }
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.side, self.level)
    }
}

/// Reconciler output. Transient: consumed by the submission step, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OrderIntent {
    /// Place a new rung at an empty slot.
    Add {
        side: PositionSide,
        level: u32,
        price: Price,
        qty: Size,
    },
    /// Cancel a live order whose slot is no longer desired.
    Cancel { cloid: ClientOrderId },
    /// Move a live order to a new price/quantity.
    Replace {
        cloid: ClientOrderId,
        price: Price,
        qty: Size,
    },
}

impl OrderIntent {
    /// Returns true for intents that add exposure (Add/Replace).
    #[must_use]
    pub fn is_order_producing(&self) -> bool {
        !matches!(self, Self::Cancel { .. })
    }
}

/// Fully specified order ready for the host to transmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Client order ID, unique for the strategy lifetime.
    pub cloid: ClientOrderId,
    /// Hedge-mode leg this order belongs to.
    pub position_side: PositionSide,
    /// Direction on the book.
    pub order_side: OrderSide,
    /// Grid level for rung orders, `None` for exits.
    #[serde(default)]
    pub level: Option<u32>,
    pub price: Price,
    pub qty: Size,
    pub reduce_only: bool,
    #[serde(default)]
    pub kind: OrderKind,
    /// Timestamp of the event that triggered this order (Unix milliseconds).
    pub created_at_ms: u64,
}

impl NewOrder {
    /// Post-only grid rung order.
    #[must_use]
    pub fn grid(
        cloid: ClientOrderId,
        key: LevelKey,
        price: Price,
        qty: Size,
        created_at_ms: u64,
    ) -> Self {
        Self {
            cloid,
            position_side: key.side,
            order_side: key.side.entry_side(),
            level: Some(key.level),
            price,
            qty,
            reduce_only: false,
            kind: OrderKind::Grid,
            created_at_ms,
        }
    }

    /// Reduce-only exit (take-profit or stop-loss) for `position_side`.
    #[must_use]
    pub fn exit(
        cloid: ClientOrderId,
        position_side: PositionSide,
        kind: OrderKind,
        price: Price,
        qty: Size,
        created_at_ms: u64,
    ) -> Self {
        Self {
            cloid,
            position_side,
            order_side: position_side.exit_side(),
            level: None,
            price,
            qty,
            reduce_only: true,
            kind,
            created_at_ms,
        }
    }

    /// Grid slot of this order, if it is a rung.
    #[must_use]
    pub fn key(&self) -> Option<LevelKey> {
        self.level.map(|level| LevelKey::new(self.position_side, level))
    }

    /// Notional value: price * qty.
    #[must_use]
    pub fn notional(&self) -> rust_decimal::Decimal {
        self.qty.notional(self.price)
    }
}

/// Concrete command handed to the host's execution gateway.
///
/// Fire-and-forget from the core's perspective: outcomes come back later
/// as [`OrderEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum OrderCommand {
    Place(NewOrder),
    Cancel {
        cloid: ClientOrderId,
    },
    /// Cancel `cloid` and rest `replacement` in its place (or amend).
    Replace {
        cloid: ClientOrderId,
        replacement: NewOrder,
    },
}

impl OrderCommand {
    #[must_use]
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }

    /// ID of the order this command creates, if any.
    #[must_use]
    pub fn new_order(&self) -> Option<&NewOrder> {
        match self {
            Self::Place(order) => Some(order),
            Self::Replace { replacement, .. } => Some(replacement),
            Self::Cancel { .. } => None,
        }
    }
}

// ============================================================================
// Lifecycle Events
// ============================================================================

/// Order lifecycle event reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Accepted {
        cloid: ClientOrderId,
        side: OrderSide,
        price: Price,
        qty: Size,
        ts_ms: u64,
    },
    Filled {
        cloid: ClientOrderId,
        price: Price,
        qty: Size,
        ts_ms: u64,
    },
    Canceled {
        cloid: ClientOrderId,
        ts_ms: u64,
    },
    /// Rejected on submission. May be retryable (would-be-taker).
    Rejected {
        cloid: ClientOrderId,
        reason: String,
        ts_ms: u64,
    },
    /// Permanently refused. Never resubmitted under the same ID.
    Denied {
        cloid: ClientOrderId,
        reason: String,
        ts_ms: u64,
    },
}

impl OrderEvent {
    #[must_use]
    pub fn cloid(&self) -> &ClientOrderId {
        match self {
            Self::Accepted { cloid, .. }
            | Self::Filled { cloid, .. }
            | Self::Canceled { cloid, .. }
            | Self::Rejected { cloid, .. }
            | Self::Denied { cloid, .. } => cloid,
        }
    }

    #[must_use]
    pub fn ts_ms(&self) -> u64 {
        match self {
            Self::Accepted { ts_ms, .. }
            | Self::Filled { ts_ms, .. }
            | Self::Canceled { ts_ms, .. }
            | Self::Rejected { ts_ms, .. }
            | Self::Denied { ts_ms, .. } => *ts_ms,
        }
    }

    /// Returns true for events counted by the circuit breaker.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Denied { .. })
    }
}

// ============================================================================
// Order Tracking
// ============================================================================

/// State of an order in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Command emitted, no acknowledgement yet.
    #[default]
    Pending,
    /// Resting on the book.
    Accepted,
    /// Cancel (or replace) sent, awaiting confirmation.
    CancelRequested,
    Filled,
    Canceled,
    Rejected,
    Denied,
}

impl OrderState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Denied
        )
    }

    /// Pending or accepted: counts as occupying its slot.
    #[must_use]
    pub fn is_working(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }
}

/// Order owned by the live-order table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveOrder {
    pub cloid: ClientOrderId,
    pub position_side: PositionSide,
    pub order_side: OrderSide,
    pub level: Option<u32>,
    pub price: Price,
    pub qty: Size,
    pub filled_qty: Size,
    pub kind: OrderKind,
    pub state: OrderState,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl LiveOrder {
    /// Track a freshly emitted order as `Pending`.
    #[must_use]
    pub fn from_new(order: &NewOrder) -> Self {
        Self {
            cloid: order.cloid.clone(),
            position_side: order.position_side,
            order_side: order.order_side,
            level: order.level,
            price: order.price,
            qty: order.qty,
            filled_qty: Size::ZERO,
            kind: order.kind,
            state: OrderState::Pending,
            created_at_ms: order.created_at_ms,
            updated_at_ms: order.created_at_ms,
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<LevelKey> {
        self.level.map(|level| LevelKey::new(self.position_side, level))
    }

    #[must_use]
    pub fn remaining_qty(&self) -> Size {
        (self.qty - self.filled_qty).non_negative()
    }

    #[must_use]
    pub fn is_fully_filled(&self) -> bool {
        self.filled_qty >= self.qty
    }
}
