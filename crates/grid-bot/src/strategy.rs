//! Grid strategy pipeline.
//!
//! One `on_market_update` call runs to completion before the next:
//!
//! 1. validate the bar and feed the regime classifier
//! 2. drawdown gate (paused: stop here)
//! 3. warm-up and quote guards
//! 4. grid center, ladder build, counter-trend shaping, funding guard
//! 5. quantization and reconciliation against the live-order table
//! 6. circuit-breaker filter and position-size gate
//! 7. ID assignment, table registration and command emission
//!
//! Order events are folded in separately through `on_order_event`.

use std::fmt;

use grid_core::{
    Bbo, ClientOrderId, FundingSample, InstrumentSpec, LevelKey, LiveOrder, MarketUpdate,
    NewOrder, OrderCommand, OrderEvent, OrderIdGenerator, OrderIntent, OrderState, PositionSide,
    Price, Size,
};
use grid_ladder::{
    build, diff, quantize, shape, ExitPlanner, FundingGuard, GridCenter, LiveOrderTable,
    RetryCoordinator, RetryOutcome,
};
use grid_regime::{IndicatorSnapshot, Regime, RegimeClassifier, RegimeError};
use grid_risk::{RiskState, RiskStatus};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::StrategyConfig;
use crate::error::AppResult;
use crate::position::{PositionBook, SidePosition};

/// Why an update produced no ladder work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Drawdown gate is holding trading.
    Paused,
    /// Classifier has not seen enough bars.
    WarmingUp,
    /// Book is crossed or has a non-positive side.
    InvalidQuote,
    /// Neither a valid book nor a usable bar close.
    NoReference,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Paused => write!(f, "paused"),
            SkipReason::WarmingUp => write!(f, "warming_up"),
            SkipReason::InvalidQuote => write!(f, "invalid_quote"),
            SkipReason::NoReference => write!(f, "no_reference"),
        }
    }
}

/// Result of one market update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub regime: Option<Regime>,
    /// Commands in emission order: cancels, replaces, adds.
    pub commands: Vec<OrderCommand>,
    pub skipped: Option<SkipReason>,
    /// Add/Replace intents withheld by an active circuit breaker.
    pub dropped_by_breaker: usize,
    /// Adds rejected by the position-size gate.
    pub rejected_by_position_gate: usize,
}

impl UpdateOutcome {
    fn skipped(regime: Option<Regime>, reason: SkipReason) -> Self {
        Self {
            regime,
            skipped: Some(reason),
            ..Self::default()
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Snapshot served to status queries.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyStatus {
    pub symbol: String,
    pub regime: Option<Regime>,
    pub indicators: IndicatorSnapshot,
    pub center: Option<Price>,
    pub recenters: u64,
    pub live_orders: usize,
    pub pending_retries: usize,
    pub long: SidePosition,
    pub short: SidePosition,
    pub risk: RiskStatus,
    pub last_skip: Option<SkipReason>,
    pub last_event_ms: u64,
}

pub struct GridStrategy {
    config: StrategyConfig,
    instrument: InstrumentSpec,
    classifier: RegimeClassifier,
    center: GridCenter,
    funding: FundingGuard,
    orders: LiveOrderTable,
    retries: RetryCoordinator,
    exits: ExitPlanner,
    risk: RiskState,
    book: PositionBook,
    ids: OrderIdGenerator,
    last_bbo: Option<Bbo>,
    last_skip: Option<SkipReason>,
    last_event_ms: u64,
}

impl GridStrategy {
    pub fn new(config: StrategyConfig, instrument: InstrumentSpec) -> AppResult<Self> {
        config.validate()?;
        instrument.validate()?;

        let ids = match &config.id_prefix {
            Some(prefix) => OrderIdGenerator::with_prefix(prefix.clone()),
            None => OrderIdGenerator::new(),
        };
        info!(
            symbol = %instrument.symbol,
            id_prefix = ids.prefix(),
            step_bps = %config.ladder.step_bps,
            levels_long = config.ladder.levels_long,
            levels_short = config.ladder.levels_short,
            "Grid strategy initialized"
        );

        Ok(Self {
            classifier: RegimeClassifier::new(config.regime.clone())?,
            center: GridCenter::new(),
            funding: FundingGuard::new(config.funding.clone()),
            orders: LiveOrderTable::new(),
            retries: RetryCoordinator::new(config.retry.clone()),
            exits: ExitPlanner::new(config.exit.clone(), config.ladder.step_bps),
            risk: RiskState::new(&config.risk)?,
            book: PositionBook::new(),
            ids,
            last_bbo: None,
            last_skip: None,
            last_event_ms: 0,
            config,
            instrument,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn instrument(&self) -> &InstrumentSpec {
        &self.instrument
    }

    pub fn orders(&self) -> &LiveOrderTable {
        &self.orders
    }

    pub fn retries(&self) -> &RetryCoordinator {
        &self.retries
    }

    pub fn risk(&self) -> &RiskState {
        &self.risk
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn center(&self) -> Option<Price> {
        self.center.current()
    }

    pub fn classifier(&self) -> &RegimeClassifier {
        &self.classifier
    }

    /// Run the full pipeline for one market update.
    ///
    /// A malformed bar returns an error and leaves every piece of state
    /// untouched.
    pub fn on_market_update(&mut self, update: &MarketUpdate) -> AppResult<UpdateOutcome> {
        let now = update.now_ms();
        self.classifier.update(&update.bar)?;
        self.observe(now);
        if let Some(bbo) = update.bbo.filter(Bbo::is_valid) {
            self.last_bbo = Some(bbo);
        }

        let check = self.risk.on_account(&update.account);
        if check.paused {
            let regime = self.classifier.regime().ok();
            return Ok(self.skip(regime, SkipReason::Paused));
        }

        let regime = match self.classifier.regime() {
            Ok(regime) => regime,
            Err(RegimeError::NotWarm { seen, required }) => {
                debug!(seen, required, "Classifier warming up");
                return Ok(self.skip(None, SkipReason::WarmingUp));
            }
            Err(e) => return Err(e.into()),
        };

        if update.bbo.is_some_and(|bbo| !bbo.is_valid()) {
            warn!(bbo = ?update.bbo, "Invalid quote, skipping update");
            return Ok(self.skip(Some(regime), SkipReason::InvalidQuote));
        }
        let Some(mid) = update.reference_mid() else {
            warn!(close = update.bar.close, "No usable reference price");
            return Ok(self.skip(Some(regime), SkipReason::NoReference));
        };

        let center = self.center.update(mid, &self.config.ladder);
        let ladders = build(center, &self.config.ladder, regime);
        let ladders = shape(ladders, regime, &self.config.shaper);
        let ladders = self.funding.adjust(ladders, now);
        let desired = quantize(ladders, &self.instrument);
        if let Err(e) = desired.verify(&self.instrument) {
            error!(error = %e, "Quantized ladder failed verification");
            return Err(e.into());
        }

        let plan = diff(&desired, &self.orders, &self.config.tolerance);
        let breaker_active = self.risk.breaker_active(now);
        let mut budget = self
            .risk
            .position_budget(self.book.qty(PositionSide::Long), self.book.qty(PositionSide::Short));

        let mut outcome = UpdateOutcome {
            regime: Some(regime),
            ..UpdateOutcome::default()
        };
        for intent in plan.into_intents() {
            if breaker_active && intent.is_order_producing() {
                outcome.dropped_by_breaker += 1;
                continue;
            }
            match intent {
                OrderIntent::Cancel { cloid } => {
                    self.orders.mark_cancel_requested(&cloid, now);
                    self.retries.resolve(&cloid);
                    outcome.commands.push(OrderCommand::Cancel { cloid });
                }
                OrderIntent::Replace { cloid, price, qty } => {
                    let Some(key) = self.orders.get(&cloid).and_then(LiveOrder::key) else {
                        warn!(%cloid, "Replace target no longer in a slot");
                        continue;
                    };
                    // Full rung size: a partial fill already has its own exits,
                    // same as a fully filled slot that gets re-added.
                    let replacement = NewOrder::grid(self.ids.next(now), key, price, qty, now);
                    self.orders.mark_cancel_requested(&cloid, now);
                    self.retries.resolve(&cloid);
                    self.register(&replacement)?;
                    outcome.commands.push(OrderCommand::Replace {
                        cloid,
                        replacement,
                    });
                }
                OrderIntent::Add {
                    side,
                    level,
                    price,
                    qty,
                } => {
                    if !budget.try_approve(side, qty, price) {
                        outcome.rejected_by_position_gate += 1;
                        continue;
                    }
                    let order =
                        NewOrder::grid(self.ids.next(now), LevelKey::new(side, level), price, qty, now);
                    self.register(&order)?;
                    outcome.commands.push(OrderCommand::Place(order));
                }
            }
        }

        if outcome.dropped_by_breaker > 0 {
            warn!(
                dropped = outcome.dropped_by_breaker,
                until_ms = ?self.risk.breaker().active_until_ms(),
                "Circuit breaker active, only cancels emitted"
            );
        }
        self.last_skip = None;
        debug!(
            bar_time = ?update.bar.datetime(),
            %regime,
            %center,
            desired = desired.len(),
            commands = outcome.commands.len(),
            live = self.orders.len(),
            position_rejects = outcome.rejected_by_position_gate,
            "Update processed"
        );
        Ok(outcome)
    }

    /// Record a funding observation.
    pub fn on_funding(&mut self, sample: FundingSample) {
        self.observe(sample.ts_ms);
        self.funding.record(sample);
    }

    /// Fold in an order lifecycle event. Returns any follow-up commands
    /// (exit orders for fills, retries for would-be-taker rejections).
    pub fn on_order_event(&mut self, event: OrderEvent) -> AppResult<Vec<OrderCommand>> {
        self.observe(event.ts_ms());
        match event {
            OrderEvent::Accepted { cloid, ts_ms, .. } => {
                if self.orders.on_accepted(&cloid, ts_ms).is_none() {
                    debug!(%cloid, "Accepted event for unknown order");
                }
                self.retries.resolve(&cloid);
                Ok(Vec::new())
            }
            OrderEvent::Filled {
                cloid,
                price,
                qty,
                ts_ms,
            } => self.on_fill(&cloid, price, qty, ts_ms),
            OrderEvent::Canceled { cloid, ts_ms } => {
                self.retries.resolve(&cloid);
                let Some(finished) = self.orders.finish(&cloid, OrderState::Canceled, ts_ms) else {
                    return Ok(Vec::new());
                };
                debug!(%cloid, "Order canceled");
                Ok(self.cancel_sibling(finished.sibling, ts_ms))
            }
            OrderEvent::Rejected {
                cloid,
                reason,
                ts_ms,
            } => self.on_rejected(&cloid, &reason, ts_ms),
            OrderEvent::Denied {
                cloid,
                reason,
                ts_ms,
            } => {
                self.risk.record_error(ts_ms);
                self.orders.finish(&cloid, OrderState::Denied, ts_ms);
                self.retries.on_denied(&cloid);
                warn!(%cloid, %reason, "Order denied");
                Ok(Vec::new())
            }
        }
    }

    pub fn status(&self) -> StrategyStatus {
        StrategyStatus {
            symbol: self.instrument.symbol.clone(),
            regime: self.classifier.regime().ok(),
            indicators: self.classifier.snapshot(),
            center: self.center.current(),
            recenters: self.center.recenters(),
            live_orders: self.orders.len(),
            pending_retries: self.retries.len(),
            long: *self.book.side(PositionSide::Long),
            short: *self.book.side(PositionSide::Short),
            risk: self.risk.status(self.last_event_ms),
            last_skip: self.last_skip,
            last_event_ms: self.last_event_ms,
        }
    }

    fn on_fill(
        &mut self,
        cloid: &ClientOrderId,
        price: Price,
        qty: Size,
        ts_ms: u64,
    ) -> AppResult<Vec<OrderCommand>> {
        let Some(fill) = self.orders.on_fill(cloid, price, qty, ts_ms) else {
            warn!(%cloid, %price, %qty, "Fill for unknown order");
            return Ok(Vec::new());
        };
        self.retries.resolve(cloid);
        let side = fill.order.position_side;

        if fill.order.kind.is_reduce_only() {
            let pnl = self.book.on_exit_fill(side, price, qty);
            self.risk.add_realized(pnl);
            info!(
                %cloid,
                %side,
                kind = ?fill.order.kind,
                %price,
                %qty,
                %pnl,
                realized_total = %self.risk.realized_pnl(),
                is_final = fill.is_final,
                "Exit filled"
            );
            return Ok(self.cancel_sibling(fill.sibling, ts_ms));
        }

        self.book.on_entry_fill(side, price, qty);
        info!(
            %cloid,
            %side,
            level = ?fill.order.level,
            %price,
            %qty,
            is_final = fill.is_final,
            "Grid order filled"
        );

        if self.risk.breaker_active(ts_ms) {
            warn!(%cloid, %side, "Circuit breaker active, exit orders suppressed");
            return Ok(Vec::new());
        }

        let exits = self
            .exits
            .plan(side, price, qty, &self.instrument, &self.ids, ts_ms);
        for exit in &exits {
            self.orders.insert_pending(exit)?;
        }
        if let [take_profit, stop_loss] = exits.as_slice() {
            self.orders.link_exits(&take_profit.cloid, &stop_loss.cloid)?;
        }
        Ok(exits.into_iter().map(OrderCommand::Place).collect())
    }

    /// Cancel the surviving leg of an exit pair.
    fn cancel_sibling(&mut self, sibling: Option<ClientOrderId>, ts_ms: u64) -> Vec<OrderCommand> {
        let Some(cloid) = sibling else {
            return Vec::new();
        };
        if !self.orders.mark_cancel_requested(&cloid, ts_ms) {
            return Vec::new();
        }
        debug!(%cloid, "Cancelling sibling exit");
        vec![OrderCommand::Cancel { cloid }]
    }

    fn on_rejected(
        &mut self,
        cloid: &ClientOrderId,
        reason: &str,
        ts_ms: u64,
    ) -> AppResult<Vec<OrderCommand>> {
        self.risk.record_error(ts_ms);
        self.orders.finish(cloid, OrderState::Rejected, ts_ms);

        if self.risk.breaker_active(ts_ms) {
            if self.retries.on_denied(cloid).is_some() {
                warn!(%cloid, reason, "Circuit breaker active, retry suppressed");
            }
            return Ok(Vec::new());
        }
        if self.risk.is_paused() {
            if self.retries.on_denied(cloid).is_some() {
                warn!(%cloid, reason, "Trading paused, retry suppressed");
            }
            return Ok(Vec::new());
        }

        let outcome = self.retries.on_rejected(
            cloid,
            reason,
            self.last_bbo.as_ref(),
            &self.instrument,
            &self.ids,
            ts_ms,
        );
        match outcome {
            RetryOutcome::Retry {
                previous,
                order,
                attempt,
            } => {
                if let Err(e) = self.orders.insert_pending(&order) {
                    warn!(%previous, error = %e, "Cannot register retry, dropping order");
                    self.retries.on_denied(&order.cloid);
                    return Ok(Vec::new());
                }
                info!(
                    %previous,
                    cloid = %order.cloid,
                    price = %order.price,
                    attempt,
                    "Re-submitting rejected order"
                );
                Ok(vec![OrderCommand::Place(order)])
            }
            RetryOutcome::Untracked => {
                warn!(%cloid, reason, "Order rejected");
                Ok(Vec::new())
            }
            RetryOutcome::Abandoned(_) | RetryOutcome::Exhausted(_) => Ok(Vec::new()),
        }
    }

    /// Register an emitted grid order in the table and the retry tracker.
    fn register(&mut self, order: &NewOrder) -> AppResult<()> {
        if let Err(e) = self.orders.insert_pending(order) {
            error!(cloid = %order.cloid, error = %e, "Failed to register order");
            return Err(e.into());
        }
        self.retries.track(order)?;
        Ok(())
    }

    fn skip(&mut self, regime: Option<Regime>, reason: SkipReason) -> UpdateOutcome {
        if self.last_skip != Some(reason) {
            info!(%reason, "Skipping ladder work");
        }
        self.last_skip = Some(reason);
        UpdateOutcome::skipped(regime, reason)
    }

    fn observe(&mut self, ts_ms: u64) {
        self.last_event_ms = self.last_event_ms.max(ts_ms);
        self.risk.refresh(self.last_event_ms);
    }
}
