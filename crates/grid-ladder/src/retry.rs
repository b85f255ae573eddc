//! Would-be-taker retry handling.
//!
//! A post-only grid order rejected because it would have crossed the spread
//! is re-issued one or more ticks further from the book under a fresh client
//! order ID. Records live in a slot arena; `by_cloid` always maps the
//! *current* ID of a logical order to its slot and is re-keyed the moment a
//! new ID is generated.
//!
//! Records are destroyed when the order is accepted, permanently rejected,
//! denied, or when the attempt bound is exceeded.

use std::collections::HashMap;

use grid_core::{Bbo, ClientOrderId, InstrumentSpec, NewOrder, OrderIdGenerator, OrderSide, Price};
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::error::{LadderError, LadderResult};

/// Bookkeeping for one logical order across its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRecord {
    /// ID of the first submission.
    pub original_cloid: ClientOrderId,
    /// Most recent submission (carries the current ID and price).
    pub order: NewOrder,
    /// Retries issued so far.
    pub attempts: u32,
    pub last_reason: Option<String>,
    /// Price of the latest retry, if any.
    pub adjusted_price: Option<Price>,
}

/// What to do with a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// ID not tracked (exit order, unknown or already resolved).
    Untracked,
    /// Hard rejection: bookkeeping removed, no retry.
    Abandoned(RetryRecord),
    /// Attempt bound exceeded: bookkeeping removed, no retry.
    Exhausted(RetryRecord),
    /// Re-submit `order` in place of `previous`.
    Retry {
        previous: ClientOrderId,
        order: NewOrder,
        attempt: u32,
    },
}

#[derive(Debug)]
pub struct RetryCoordinator {
    config: RetryConfig,
    arena: Vec<Option<RetryRecord>>,
    free: Vec<usize>,
    by_cloid: HashMap<ClientOrderId, usize>,
    /// Lower-cased `taker_reject_patterns`.
    patterns: Vec<String>,
}

impl RetryCoordinator {
    pub fn new(config: RetryConfig) -> Self {
        let patterns = config
            .taker_reject_patterns
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        Self {
            config,
            arena: Vec::new(),
            free: Vec::new(),
            by_cloid: HashMap::new(),
            patterns,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// True if `reason` describes a would-be-taker (post-only) rejection.
    ///
    /// Patterns match case-insensitively and never inside a longer word:
    /// `alo` matches "ALO order" but not "aloha".
    pub fn is_taker_rejection(&self, reason: &str) -> bool {
        let reason = reason.to_lowercase();
        self.patterns
            .iter()
            .any(|p| contains_word(&reason, p.as_str()))
    }

    /// Start tracking a freshly emitted grid order.
    pub fn track(&mut self, order: &NewOrder) -> LadderResult<()> {
        if self.by_cloid.contains_key(&order.cloid) {
            return Err(LadderError::DuplicateOrderId(order.cloid.clone()));
        }
        let record = RetryRecord {
            original_cloid: order.cloid.clone(),
            order: order.clone(),
            attempts: 0,
            last_reason: None,
            adjusted_price: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.arena[slot] = Some(record);
                slot
            }
            None => {
                self.arena.push(Some(record));
                self.arena.len() - 1
            }
        };
        self.by_cloid.insert(order.cloid.clone(), slot);
        Ok(())
    }

    pub fn get(&self, cloid: &ClientOrderId) -> Option<&RetryRecord> {
        self.by_cloid
            .get(cloid)
            .and_then(|&slot| self.arena.get(slot))
            .and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_cloid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_cloid.is_empty()
    }

    /// Order reached the book (or finished): retry succeeded, drop the record.
    pub fn resolve(&mut self, cloid: &ClientOrderId) -> Option<RetryRecord> {
        let record = self.release(cloid)?;
        if record.attempts > 0 {
            info!(
                %cloid,
                original = %record.original_cloid,
                attempts = record.attempts,
                "Retry succeeded"
            );
        }
        Some(record)
    }

    /// Denied: the venue will never accept this ID. Drop immediately.
    pub fn on_denied(&mut self, cloid: &ClientOrderId) -> Option<RetryRecord> {
        self.release(cloid)
    }

    /// Handle a rejection and decide whether to retry.
    pub fn on_rejected(
        &mut self,
        cloid: &ClientOrderId,
        reason: &str,
        bbo: Option<&Bbo>,
        instrument: &InstrumentSpec,
        ids: &OrderIdGenerator,
        event_ts_ms: u64,
    ) -> RetryOutcome {
        let Some(&slot) = self.by_cloid.get(cloid) else {
            return RetryOutcome::Untracked;
        };

        if !self.is_taker_rejection(reason) {
            return match self.release(cloid) {
                Some(record) => {
                    warn!(%cloid, reason, "Hard rejection, not retrying");
                    RetryOutcome::Abandoned(record)
                }
                None => RetryOutcome::Untracked,
            };
        }

        let Some(record) = self.arena.get(slot).and_then(Option::as_ref) else {
            return RetryOutcome::Untracked;
        };
        let attempt = record.attempts + 1;
        if attempt > self.config.max_attempts {
            return match self.release(cloid) {
                Some(mut record) => {
                    record.last_reason = Some(reason.to_string());
                    warn!(
                        %cloid,
                        original = %record.original_cloid,
                        attempts = record.attempts,
                        "Retry attempts exhausted, dropping order"
                    );
                    RetryOutcome::Exhausted(record)
                }
                None => RetryOutcome::Untracked,
            };
        }

        let price = retry_price(
            record.order.order_side,
            record.order.price,
            bbo,
            attempt,
            instrument,
        );
        if !price.is_positive() || !instrument.meets_min_notional(price, record.order.qty) {
            return match self.release(cloid) {
                Some(record) => {
                    warn!(%cloid, %price, "Retry price not viable, dropping order");
                    RetryOutcome::Abandoned(record)
                }
                None => RetryOutcome::Untracked,
            };
        }

        let new_cloid = ids.next(event_ts_ms);
        let Some(record) = self.arena.get_mut(slot).and_then(Option::as_mut) else {
            return RetryOutcome::Untracked;
        };
        record.attempts = attempt;
        record.last_reason = Some(reason.to_string());
        record.adjusted_price = Some(price);
        record.order.cloid = new_cloid.clone();
        record.order.price = price;
        record.order.created_at_ms = event_ts_ms;
        let order = record.order.clone();

        // Re-key before anything else can observe the old ID.
        self.by_cloid.remove(cloid);
        self.by_cloid.insert(new_cloid.clone(), slot);

        debug!(
            previous = %cloid,
            new = %new_cloid,
            %price,
            attempt,
            "Would-be-taker rejection, retrying"
        );
        RetryOutcome::Retry {
            previous: cloid.clone(),
            order,
            attempt,
        }
    }

    fn release(&mut self, cloid: &ClientOrderId) -> Option<RetryRecord> {
        let slot = self.by_cloid.remove(cloid)?;
        let record = self.arena.get_mut(slot).and_then(Option::take)?;
        self.free.push(slot);
        Some(record)
    }
}

/// Price for retry number `attempt` (1-based).
///
/// - Buy: `min(original − tick, best_ask − attempt × tick)`, floored
/// - Sell: `max(original + tick, best_bid + attempt × tick)`, ceiled
///
/// Without a valid book only the original-price term applies.
pub fn retry_price(
    side: OrderSide,
    original: Price,
    bbo: Option<&Bbo>,
    attempt: u32,
    instrument: &InstrumentSpec,
) -> Price {
    let tick = instrument.tick_size;
    let away = tick * rust_decimal::Decimal::from(attempt);
    let book = bbo.filter(|b| b.is_valid());
    let raw = match side {
        OrderSide::Buy => {
            let from_order = original - tick;
            match book {
                Some(b) => from_order.min(b.ask_price - away),
                None => from_order,
            }
        }
        OrderSide::Sell => {
            let from_order = original + tick;
            match book {
                Some(b) => from_order.max(b.bid_price + away),
                None => from_order,
            }
        }
    };
    instrument.round_price_passive(raw, side)
}

/// Substring match that requires a word boundary wherever the pattern
/// starts or ends with an alphanumeric character.
fn contains_word(haystack: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    let starts_alnum = pattern.chars().next().is_some_and(char::is_alphanumeric);
    let ends_alnum = pattern.chars().last().is_some_and(char::is_alphanumeric);
    haystack.match_indices(pattern).any(|(start, _)| {
        let end = start + pattern.len();
        let before_ok = !starts_alnum
            || !haystack[..start].chars().last().is_some_and(char::is_alphanumeric);
        let after_ok =
            !ends_alnum || !haystack[end..].chars().next().is_some_and(char::is_alphanumeric);
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::{LevelKey, PositionSide, Size};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    const TAKER: &str = "Post only order would immediately match";

    fn instrument() -> InstrumentSpec {
        InstrumentSpec::new(
            "BTCUSDT",
            Price::new(dec!(0.1)),
            Size::new(dec!(0.001)),
            dec!(5),
        )
    }

    fn buy_at(ids: &OrderIdGenerator, price: Price) -> NewOrder {
        NewOrder::grid(
            ids.next(1_000),
            LevelKey::new(PositionSide::Long, 0),
            price,
            Size::new(dec!(0.01)),
            1_000,
        )
    }

    fn book(bid: Price, ask: Price) -> Bbo {
        Bbo::new(bid, ask)
    }

    #[test]
    fn test_taker_classification() {
        let coordinator = RetryCoordinator::new(RetryConfig::default());
        assert!(coordinator.is_taker_rejection(TAKER));
        assert!(coordinator.is_taker_rejection("Order could not immediately match: ALO"));
        assert!(coordinator.is_taker_rejection("code -5022: post-only rejected"));
        assert!(!coordinator.is_taker_rejection("Insufficient margin"));
    }

    #[test]
    fn test_short_patterns_match_whole_words_only() {
        let coordinator = RetryCoordinator::new(RetryConfig::default());
        assert!(coordinator.is_taker_rejection("ALO order rejected"));
        assert!(coordinator.is_taker_rejection("rejected (alo)"));
        assert!(!coordinator.is_taker_rejection("Position halo exceeded"));
        assert!(!coordinator.is_taker_rejection("Order size too small for allocation"));
        assert!(!coordinator.is_taker_rejection("Price out of range for Salon market"));
        assert!(coordinator.is_taker_rejection("error -5022"));
    }

    #[test]
    fn test_retry_scenario_moves_below_ask() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig::default());
        let order = buy_at(&ids, Price::new(dec!(50000)));
        coordinator.track(&order).unwrap();

        let bbo = book(Price::new(dec!(49998)), Price::new(dec!(49999)));
        let outcome = coordinator.on_rejected(
            &order.cloid,
            TAKER,
            Some(&bbo),
            &instrument(),
            &ids,
            2_000,
        );

        let RetryOutcome::Retry {
            previous,
            order: retry,
            attempt,
        } = outcome
        else {
            panic!("expected a retry");
        };
        assert_eq!(previous, order.cloid);
        assert_eq!(attempt, 1);
        assert_ne!(retry.cloid, order.cloid);
        assert!(retry.price.inner() <= dec!(49999) - dec!(0.1));
        assert_eq!(retry.created_at_ms, 2_000);

        // Re-keyed: old ID gone, new ID carries the record.
        assert!(coordinator.get(&order.cloid).is_none());
        let record = coordinator.get(&retry.cloid).unwrap();
        assert_eq!(record.attempts, 1);
        assert_eq!(record.original_cloid, order.cloid);
        assert_eq!(record.adjusted_price, Some(retry.price));
        assert_eq!(coordinator.len(), 1);
    }

    #[test]
    fn test_sell_retry_moves_above_bid() {
        let price = retry_price(
            OrderSide::Sell,
            Price::new(dec!(100.0)),
            Some(&book(Price::new(dec!(100.5)), Price::new(dec!(100.6)))),
            2,
            &instrument(),
        );
        assert_eq!(price.inner(), dec!(100.7));
    }

    #[test]
    fn test_retry_without_book_steps_one_tick() {
        let price = retry_price(
            OrderSide::Buy,
            Price::new(dec!(50000)),
            None,
            1,
            &instrument(),
        );
        assert_eq!(price.inner(), dec!(49999.9));
    }

    #[test]
    fn test_attempts_bounded_and_ids_unique() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig {
            max_attempts: 3,
            ..RetryConfig::default()
        });
        let order = buy_at(&ids, Price::new(dec!(50000)));
        coordinator.track(&order).unwrap();

        let bbo = book(Price::new(dec!(49000)), Price::new(dec!(49001)));
        let mut seen = HashSet::from([order.cloid.clone()]);
        let mut current = order.cloid.clone();
        for expected in 1..=3 {
            match coordinator.on_rejected(&current, TAKER, Some(&bbo), &instrument(), &ids, 5) {
                RetryOutcome::Retry { order, attempt, .. } => {
                    assert_eq!(attempt, expected);
                    assert!(seen.insert(order.cloid.clone()));
                    current = order.cloid;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        let last = coordinator.on_rejected(&current, TAKER, Some(&bbo), &instrument(), &ids, 5);
        assert!(matches!(last, RetryOutcome::Exhausted(ref r) if r.attempts == 3));
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_hard_reject_abandons() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig::default());
        let order = buy_at(&ids, Price::new(dec!(50000)));
        coordinator.track(&order).unwrap();

        let outcome = coordinator.on_rejected(
            &order.cloid,
            "Insufficient margin",
            None,
            &instrument(),
            &ids,
            5,
        );
        assert!(matches!(outcome, RetryOutcome::Abandoned(_)));
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_denied_never_retried() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig::default());
        let order = buy_at(&ids, Price::new(dec!(50000)));
        coordinator.track(&order).unwrap();

        assert!(coordinator.on_denied(&order.cloid).is_some());
        let outcome =
            coordinator.on_rejected(&order.cloid, TAKER, None, &instrument(), &ids, 5);
        assert_eq!(outcome, RetryOutcome::Untracked);
    }

    #[test]
    fn test_arena_slots_reused() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig::default());
        for _ in 0..10 {
            let order = buy_at(&ids, Price::new(dec!(50000)));
            coordinator.track(&order).unwrap();
            assert!(coordinator.resolve(&order.cloid).is_some());
        }
        assert_eq!(coordinator.arena.len(), 1);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_duplicate_track_rejected() {
        let ids = OrderIdGenerator::with_prefix("t");
        let mut coordinator = RetryCoordinator::new(RetryConfig::default());
        let order = buy_at(&ids, Price::new(dec!(50000)));
        coordinator.track(&order).unwrap();
        assert!(matches!(
            coordinator.track(&order),
            Err(LadderError::DuplicateOrderId(_))
        ));
    }
}
