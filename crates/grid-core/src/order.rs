//! Order-related types and identifiers.
//!
//! Provides order side, hedge-mode position side, order kind and the client
//! order ID generator for the grid core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Position-side tag for hedge-style accounting.
///
/// Also names the ladder a rung belongs to: the LONG ladder rests bids below
/// the grid center, the SHORT ladder rests asks above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Order side that opens (adds to) this position.
    pub fn entry_side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }

    /// Order side that reduces this position.
    pub fn exit_side(&self) -> OrderSide {
        self.entry_side().opposite()
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// What an order is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Resting grid rung (post-only limit).
    #[default]
    Grid,
    /// Reduce-only limit on the favorable side of a fill.
    TakeProfit,
    /// Reduce-only stop trigger on the unfavorable side of a fill.
    StopLoss,
}

impl OrderKind {
    pub fn is_reduce_only(&self) -> bool {
        matches!(self, Self::TakeProfit | Self::StopLoss)
    }
}

/// Client order ID.
///
/// CRITICAL: Every order issued by the core must carry an ID that is unique
/// for the lifetime of the strategy instance, including every retry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create from an existing string (for parsing host events).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for ClientOrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Process-wide sequence shared by every generator.
static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Generates collision-free client order IDs.
///
/// Format: `{prefix}-{event_ts_ms}-{seq}`. The timestamp is the triggering
/// event's own timestamp, never a wall-clock sample, and `seq` is a
/// process-wide monotonic counter, so two IDs issued within the same
/// millisecond still differ.
#[derive(Debug, Clone)]
pub struct OrderIdGenerator {
    prefix: String,
}

impl OrderIdGenerator {
    /// Create a generator with a random 8-character instance tag.
    pub fn new() -> Self {
        let tag = Uuid::new_v4().simple().to_string();
        Self::with_prefix(format!("g{}", &tag[..8]))
    }

    /// Create a generator with an explicit instance tag.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Issue the next identifier for an event stamped `event_ts_ms`.
    pub fn next(&self, event_ts_ms: u64) -> ClientOrderId {
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        ClientOrderId(format!("{}-{}-{}", self.prefix, event_ts_ms, seq))
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
