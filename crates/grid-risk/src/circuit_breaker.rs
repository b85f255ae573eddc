//! Error-rate circuit breaker.
//!
//! Counts rejection/deny events in a trailing window. More than
//! `max_errors` events inside the window trips the breaker, which then
//! blocks Add/Replace work (cancels still pass) until the cooldown ends.
//!
//! All times are event timestamps supplied by the caller.

use std::collections::VecDeque;

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    max_errors: u32,
    window_ms: u64,
    cooldown_ms: u64,
    /// Error timestamps inside the window, oldest first. Holds at most
    /// `max_errors + 1` entries.
    errors: VecDeque<u64>,
    active_until_ms: Option<u64>,
    trips: u64,
}

impl CircuitBreaker {
    pub fn new(max_errors: u32, window_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            max_errors,
            window_ms,
            cooldown_ms,
            errors: VecDeque::with_capacity(max_errors as usize + 1),
            active_until_ms: None,
            trips: 0,
        }
    }

    /// Record one error. Returns true if this error tripped the breaker.
    pub fn record_error(&mut self, ts_ms: u64) -> bool {
        self.prune(ts_ms);
        if self.errors.len() > self.max_errors as usize {
            self.errors.pop_front();
        }
        let idx = self.errors.partition_point(|&t| t <= ts_ms);
        self.errors.insert(idx, ts_ms);

        if self.errors.len() > self.max_errors as usize && !self.is_active(ts_ms) {
            let until = ts_ms + self.cooldown_ms;
            self.active_until_ms = Some(until);
            self.trips += 1;
            warn!(
                errors = self.errors.len(),
                window_ms = self.window_ms,
                until_ms = until,
                "Circuit breaker tripped"
            );
            return true;
        }
        false
    }

    /// True while the cooldown is running.
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.active_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Clear an expired trip. Returns true if the breaker just closed.
    pub fn refresh(&mut self, now_ms: u64) -> bool {
        match self.active_until_ms {
            Some(until) if now_ms >= until => {
                self.active_until_ms = None;
                self.errors.clear();
                info!(now_ms, "Circuit breaker cooldown ended");
                true
            }
            _ => false,
        }
    }

    pub fn active_until_ms(&self) -> Option<u64> {
        self.active_until_ms
    }

    /// Errors currently inside the window ending at `now_ms`.
    pub fn error_count(&self, now_ms: u64) -> usize {
        self.errors
            .iter()
            .filter(|&&t| self.in_window(t, now_ms))
            .count()
    }

    pub fn trips(&self) -> u64 {
        self.trips
    }

    fn prune(&mut self, now_ms: u64) {
        while self
            .errors
            .front()
            .is_some_and(|&t| !self.in_window(t, now_ms))
        {
            self.errors.pop_front();
        }
    }

    /// An error at `ts_ms` counts while less than `window_ms` old.
    fn in_window(&self, ts_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(ts_ms) < self.window_ms
    }
}
