//! Single-writer actor around the strategy.
//!
//! Host events from any number of producers are queued on one mpsc
//! channel and applied to the `GridStrategy` strictly in order. Commands
//! go out through an `OrderGateway`; the latest `StrategyStatus` is
//! published after every event for concurrent readers.

use std::sync::Arc;

use grid_core::{FundingSample, MarketUpdate, OrderCommand, OrderEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::strategy::{GridStrategy, StrategyStatus};

/// Everything the host can deliver to the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Market(MarketUpdate),
    Funding(FundingSample),
    Order(OrderEvent),
    Shutdown,
}

/// Submission boundary to the venue. Fire-and-forget: outcomes come back
/// later as `HostEvent::Order`.
#[cfg_attr(test, mockall::automock)]
pub trait OrderGateway: Send {
    fn submit(&mut self, command: &OrderCommand) -> AppResult<()>;
}

/// Shared, read-mostly view of the strategy status.
pub type StatusHandle = Arc<RwLock<StrategyStatus>>;

/// Counters returned when the actor stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActorStats {
    pub events: u64,
    pub commands: u64,
    pub event_errors: u64,
    pub gateway_errors: u64,
}

pub struct StrategyActor {
    strategy: GridStrategy,
    gateway: Box<dyn OrderGateway>,
    events: mpsc::Receiver<HostEvent>,
    status: StatusHandle,
    stats: ActorStats,
}

impl StrategyActor {
    /// Create the actor and the sender half of its event queue.
    pub fn new(
        strategy: GridStrategy,
        gateway: Box<dyn OrderGateway>,
        capacity: usize,
    ) -> (Self, mpsc::Sender<HostEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let status = Arc::new(RwLock::new(strategy.status()));
        let actor = Self {
            strategy,
            gateway,
            events: rx,
            status,
            stats: ActorStats::default(),
        };
        (actor, tx)
    }

    pub fn status_handle(&self) -> StatusHandle {
        Arc::clone(&self.status)
    }

    pub fn strategy(&self) -> &GridStrategy {
        &self.strategy
    }

    pub fn stats(&self) -> ActorStats {
        self.stats
    }

    /// Process events until `Shutdown` arrives or every sender is dropped.
    pub async fn run(mut self) -> AppResult<ActorStats> {
        info!("Strategy actor started");
        while let Some(event) = self.events.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        info!(
            events = self.stats.events,
            commands = self.stats.commands,
            event_errors = self.stats.event_errors,
            gateway_errors = self.stats.gateway_errors,
            "Strategy actor stopped"
        );
        Ok(self.stats)
    }

    /// Apply one event. Returns false on shutdown.
    ///
    /// Errors from a single event are logged and counted; the actor keeps
    /// running.
    pub fn handle(&mut self, event: HostEvent) -> bool {
        let result = match event {
            HostEvent::Market(update) => self
                .strategy
                .on_market_update(&update)
                .map(|outcome| outcome.commands),
            HostEvent::Funding(sample) => {
                self.strategy.on_funding(sample);
                Ok(Vec::new())
            }
            HostEvent::Order(event) => self.strategy.on_order_event(event),
            HostEvent::Shutdown => {
                info!("Shutdown event received");
                return false;
            }
        };
        self.stats.events += 1;

        match result {
            Ok(commands) => self.dispatch(&commands),
            Err(e) => {
                self.stats.event_errors += 1;
                warn!(error = %e, "Event rejected");
            }
        }

        *self.status.write() = self.strategy.status();
        true
    }

    fn dispatch(&mut self, commands: &[OrderCommand]) {
        for command in commands {
            match self.gateway.submit(command) {
                Ok(()) => self.stats.commands += 1,
                Err(e) => {
                    self.stats.gateway_errors += 1;
                    warn!(error = %e, ?command, "Gateway submission failed");
                }
            }
        }
        if !commands.is_empty() {
            debug!(count = commands.len(), "Commands dispatched");
        }
    }
}
