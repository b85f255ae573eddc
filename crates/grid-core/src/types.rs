//! Host-supplied market and account data.
//!
//! Contains OHLCV bars, best bid/offer, account snapshots and funding
//! samples, plus the per-update bundle handed to the pipeline.

use crate::error::{CoreError, Result};
use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV bar. Produced by the host, immutable once received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Bar timestamp (Unix milliseconds).
    pub timestamp_ms: u64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64, timestamp_ms: u64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp_ms,
        }
    }

    /// Check that the bar is internally consistent.
    ///
    /// All values must be finite, prices strictly positive, volume
    /// non-negative and `low <= open, close <= high`.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(self.malformed(format!("{name} is not finite ({value})")));
            }
        }
        for (name, value) in &fields[..4] {
            if *value <= 0.0 {
                return Err(self.malformed(format!("{name} must be positive ({value})")));
            }
        }
        if self.volume < 0.0 {
            return Err(self.malformed(format!("volume is negative ({})", self.volume)));
        }
        if self.high < self.low {
            return Err(self.malformed(format!(
                "high {} below low {}",
                self.high, self.low
            )));
        }
        if self.high < self.open.max(self.close) || self.low > self.open.min(self.close) {
            return Err(self.malformed(format!(
                "open {} / close {} outside [{}, {}]",
                self.open, self.close, self.low, self.high
            )));
        }
        Ok(())
    }

    /// Bar timestamp as a UTC datetime (for logging).
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms as i64)
    }

    fn malformed(&self, reason: String) -> CoreError {
        CoreError::MalformedBar {
            ts_ms: self.timestamp_ms,
            reason,
        }
    }
}

/// Best bid and offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bbo {
    pub bid_price: Price,
    pub ask_price: Price,
}

impl Bbo {
    pub fn new(bid_price: Price, ask_price: Price) -> Self {
        Self {
            bid_price,
            ask_price,
        }
    }

    /// Both sides positive and not crossed.
    pub fn is_valid(&self) -> bool {
        self.bid_price.is_positive()
            && self.ask_price.is_positive()
            && self.bid_price < self.ask_price
    }

    /// Mid price: (bid + ask) / 2. `None` when the book is not valid.
    pub fn mid_price(&self) -> Option<Price> {
        if !self.is_valid() {
            return None;
        }
        Some(Price::new(
            (self.bid_price.inner() + self.ask_price.inner()) / Decimal::TWO,
        ))
    }

    /// Spread in basis points relative to mid.
    pub fn spread_bps(&self) -> Option<Decimal> {
        let mid = self.mid_price()?;
        Some((self.ask_price.inner() - self.bid_price.inner()) / mid.inner() * Decimal::from(10000))
    }
}

/// Account state polled or pushed by the host at least once per update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Wallet balance (includes realized PnL).
    pub balance: Decimal,
    /// Unrealized PnL across open positions.
    #[serde(default)]
    pub unrealized_pnl: Decimal,
}

impl AccountSnapshot {
    pub fn new(balance: Decimal, unrealized_pnl: Decimal) -> Self {
        Self {
            balance,
            unrealized_pnl,
        }
    }

    /// Marked-to-market equity.
    pub fn equity(&self) -> Decimal {
        self.balance + self.unrealized_pnl
    }
}

/// One funding-rate observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSample {
    /// Observation timestamp (Unix milliseconds).
    pub ts_ms: u64,
    /// Funding rate per funding interval (0.0001 = 1 bp). Positive = longs pay.
    pub rate: Decimal,
}

impl FundingSample {
    pub fn new(ts_ms: u64, rate: Decimal) -> Self {
        Self { ts_ms, rate }
    }
}

/// Everything the pipeline consumes for one market update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub bar: Bar,
    /// Top of book at the time of the bar, if the host has one.
    #[serde(default)]
    pub bbo: Option<Bbo>,
    pub account: AccountSnapshot,
}

impl MarketUpdate {
    /// Update timestamp (taken from the bar).
    pub fn now_ms(&self) -> u64 {
        self.bar.timestamp_ms
    }

    /// Mid from the book, falling back to the bar close.
    pub fn reference_mid(&self) -> Option<Price> {
        if let Some(mid) = self.bbo.as_ref().and_then(Bbo::mid_price) {
            return Some(mid);
        }
        Decimal::from_f64_retain(self.bar.close)
            .filter(|d| d.is_sign_positive() && !d.is_zero())
            .map(Price::new)
    }
}
