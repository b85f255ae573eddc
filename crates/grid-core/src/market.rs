//! Instrument specification types.
//!
//! Venue-mandated granularity for one instrument. Static for a run.

use crate::error::{CoreError, Result};
use crate::order::OrderSide;
use crate::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instrument constraints from the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Instrument symbol (e.g., "BTCUSDT").
    pub symbol: String,

    /// Minimum price increment.
    pub tick_size: Price,

    /// Minimum quantity increment.
    pub step_size: Size,

    /// Minimum order notional (price × quantity) in quote currency.
    pub min_notional: Decimal,
}

impl InstrumentSpec {
    pub fn new(
        symbol: impl Into<String>,
        tick_size: Price,
        step_size: Size,
        min_notional: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            step_size,
            min_notional,
        }
    }

    /// Reject specs that would make quantization meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.tick_size.is_positive() {
            return Err(CoreError::InvalidInstrument(format!(
                "{}: tick_size must be positive, got {}",
                self.symbol, self.tick_size
            )));
        }
        if !self.step_size.is_positive() {
            return Err(CoreError::InvalidInstrument(format!(
                "{}: step_size must be positive, got {}",
                self.symbol, self.step_size
            )));
        }
        if self.min_notional.is_sign_negative() {
            return Err(CoreError::InvalidInstrument(format!(
                "{}: min_notional must be non-negative, got {}",
                self.symbol, self.min_notional
            )));
        }
        Ok(())
    }

    /// Round a resting order's price toward the passive side.
    ///
    /// - Buy orders: round DOWN to tick (never up through the ask)
    /// - Sell orders: round UP to tick (never down through the bid)
    pub fn round_price_passive(&self, price: Price, side: OrderSide) -> Price {
        match side {
            OrderSide::Buy => price.floor_to_tick(self.tick_size),
            OrderSide::Sell => price.ceil_to_tick(self.tick_size),
        }
    }

    /// Round a quantity down to the step size.
    pub fn round_qty(&self, qty: Size) -> Size {
        qty.floor_to_step(self.step_size)
    }

    /// True if `price × qty` reaches the minimum notional.
    pub fn meets_min_notional(&self, price: Price, qty: Size) -> bool {
        qty.notional(price) >= self.min_notional
    }

    /// True if both values sit exactly on the instrument grid.
    pub fn is_quantized(&self, price: Price, qty: Size) -> bool {
        price.is_on_tick(self.tick_size) && qty.is_on_step(self.step_size)
    }
}
