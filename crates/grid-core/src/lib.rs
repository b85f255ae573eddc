//! Core domain types for the grid strategy core.
//!
//! This crate provides the types shared by every pipeline stage:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `InstrumentSpec`: Tick size, step size and minimum notional
//! - `PositionSide`, `OrderSide`: Hedge-mode position tags and order direction
//! - `ClientOrderId`, `OrderIdGenerator`: Collision-free order identifiers
//! - `Bar`, `Bbo`, `AccountSnapshot`, `FundingSample`: Host inputs
//! - `OrderIntent`, `OrderCommand`, `OrderEvent`, `LiveOrder`: Order lifecycle

pub mod decimal;
pub mod error;
pub mod execution;
pub mod market;
pub mod order;
pub mod types;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use market::InstrumentSpec;
pub use order::{ClientOrderId, OrderIdGenerator, OrderKind, OrderSide, PositionSide};
pub use types::{AccountSnapshot, Bar, Bbo, FundingSample, MarketUpdate};

pub use execution::{LevelKey, LiveOrder, NewOrder, OrderCommand, OrderEvent, OrderIntent, OrderState};
