//! Aggregate risk state read by the pipeline entry point.

use std::fmt;

use grid_core::{AccountSnapshot, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreaker;
use crate::config::RiskConfig;
use crate::drawdown::{DrawdownCheck, DrawdownGate};
use crate::error::RiskResult;
use crate::position_size::{PositionBudget, PositionSizeGate};

/// Why order-producing work is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    Drawdown,
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::Drawdown => write!(f, "drawdown"),
        }
    }
}

/// Point-in-time view of the risk gates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskStatus {
    pub paused: bool,
    pub pause_reason: Option<PauseReason>,
    pub breaker_active: bool,
    pub breaker_until_ms: Option<u64>,
    pub peak_equity: Option<Decimal>,
    pub realized_pnl: Decimal,
    pub drawdown_pct: Decimal,
}

/// Owns the drawdown gate, the circuit breaker and the position-size gate.
#[derive(Debug, Clone)]
pub struct RiskState {
    drawdown: DrawdownGate,
    breaker: CircuitBreaker,
    position_gate: PositionSizeGate,
    realized_pnl: Decimal,
    last_balance: Decimal,
    last_drawdown_pct: Decimal,
}

impl RiskState {
    pub fn new(config: &RiskConfig) -> RiskResult<Self> {
        config.validate()?;
        Ok(Self {
            drawdown: DrawdownGate::new(config.max_drawdown_pct, config.resume_hysteresis_pct),
            breaker: CircuitBreaker::new(
                config.max_errors_per_minute,
                config.error_window_ms,
                config.breaker_cooldown_ms,
            ),
            position_gate: PositionSizeGate::new(config.max_position_fraction),
            realized_pnl: Decimal::ZERO,
            last_balance: Decimal::ZERO,
            last_drawdown_pct: Decimal::ZERO,
        })
    }

    /// Fold in the latest account snapshot.
    pub fn on_account(&mut self, account: &AccountSnapshot) -> DrawdownCheck {
        self.last_balance = account.balance;
        let check = self.drawdown.update(account.equity());
        self.last_drawdown_pct = check.drawdown_pct;
        check
    }

    /// Record a rejection or denial. Returns true if the breaker tripped.
    pub fn record_error(&mut self, ts_ms: u64) -> bool {
        self.breaker.record_error(ts_ms)
    }

    /// Close an expired breaker. Returns true on the closing edge.
    pub fn refresh(&mut self, now_ms: u64) -> bool {
        self.breaker.refresh(now_ms)
    }

    pub fn add_realized(&mut self, pnl: Decimal) {
        self.realized_pnl += pnl;
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn is_paused(&self) -> bool {
        self.drawdown.is_paused()
    }

    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.is_paused().then_some(PauseReason::Drawdown)
    }

    pub fn breaker_active(&self, now_ms: u64) -> bool {
        self.breaker.is_active(now_ms)
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Budget for this cycle's adds against the last seen balance.
    pub fn position_budget(&self, long_filled: Size, short_filled: Size) -> PositionBudget {
        self.position_gate
            .budget(self.last_balance, long_filled, short_filled)
    }

    pub fn status(&self, now_ms: u64) -> RiskStatus {
        let breaker_active = self.breaker.is_active(now_ms);
        RiskStatus {
            paused: self.is_paused(),
            pause_reason: self.pause_reason(),
            breaker_active,
            breaker_until_ms: if breaker_active {
                self.breaker.active_until_ms()
            } else {
                None
            },
            peak_equity: self.drawdown.peak(),
            realized_pnl: self.realized_pnl,
            drawdown_pct: self.last_drawdown_pct,
        }
    }
}
