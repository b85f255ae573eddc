//! Drawdown gate.
//!
//! Tracks the peak marked-to-market equity. Trading pauses once the
//! drawdown from that peak exceeds `max_drawdown_pct` and resumes only
//! after it recovers to `max_drawdown_pct - resume_hysteresis_pct`.

use rust_decimal::Decimal;
use tracing::{info, warn};

/// Pause/resume edge produced by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawdownTransition {
    Paused,
    Resumed,
}

/// Result of one equity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawdownCheck {
    pub equity: Decimal,
    pub peak: Decimal,
    /// (peak − equity) / peak × 100, never negative.
    pub drawdown_pct: Decimal,
    pub paused: bool,
    pub transition: Option<DrawdownTransition>,
}

#[derive(Debug, Clone)]
pub struct DrawdownGate {
    max_drawdown_pct: Decimal,
    resume_hysteresis_pct: Decimal,
    peak: Option<Decimal>,
    paused: bool,
}

impl DrawdownGate {
    pub fn new(max_drawdown_pct: Decimal, resume_hysteresis_pct: Decimal) -> Self {
        Self {
            max_drawdown_pct,
            resume_hysteresis_pct,
            peak: None,
            paused: false,
        }
    }

    /// Seed the peak explicitly (e.g. from a previous session).
    pub fn with_peak(mut self, peak: Decimal) -> Self {
        self.peak = Some(peak);
        self
    }

    pub fn peak(&self) -> Option<Decimal> {
        self.peak
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn resume_threshold_pct(&self) -> Decimal {
        self.max_drawdown_pct - self.resume_hysteresis_pct
    }

    /// Fold in the latest equity and update the paused flag.
    pub fn update(&mut self, equity: Decimal) -> DrawdownCheck {
        let peak = match self.peak {
            Some(peak) if peak >= equity => peak,
            _ => equity,
        };
        self.peak = Some(peak);

        let drawdown_pct = if peak > Decimal::ZERO {
            ((peak - equity) / peak * Decimal::ONE_HUNDRED).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        let mut transition = None;
        if !self.paused && drawdown_pct > self.max_drawdown_pct {
            self.paused = true;
            transition = Some(DrawdownTransition::Paused);
            warn!(
                %equity,
                %peak,
                %drawdown_pct,
                max_drawdown_pct = %self.max_drawdown_pct,
                "Drawdown limit breached, pausing"
            );
        } else if self.paused && drawdown_pct <= self.resume_threshold_pct() {
            self.paused = false;
            transition = Some(DrawdownTransition::Resumed);
            info!(
                %equity,
                %peak,
                %drawdown_pct,
                "Drawdown recovered, resuming"
            );
        }

        DrawdownCheck {
            equity,
            peak,
            drawdown_pct,
            paused: self.paused,
            transition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pause_at_eleven_percent() {
        let mut gate = DrawdownGate::new(dec!(10), dec!(2));
        assert!(!gate.update(dec!(10000)).paused);

        let check = gate.update(dec!(8900));
        assert_eq!(check.drawdown_pct, dec!(11));
        assert!(check.paused);
        assert_eq!(check.transition, Some(DrawdownTransition::Paused));
    }

    #[test]
    fn test_exactly_at_threshold_does_not_pause() {
        let mut gate = DrawdownGate::new(dec!(10), dec!(2));
        gate.update(dec!(10000));
        assert!(!gate.update(dec!(9000)).paused);
    }

    #[test]
    fn test_resume_requires_hysteresis() {
        let mut gate = DrawdownGate::new(dec!(10), dec!(2));
        gate.update(dec!(10000));
        gate.update(dec!(8900));

        // 9% drawdown: below the pause line but above the 8% resume line.
        let check = gate.update(dec!(9100));
        assert!(check.paused);
        assert_eq!(check.transition, None);

        let check = gate.update(dec!(9200));
        assert!(!check.paused);
        assert_eq!(check.transition, Some(DrawdownTransition::Resumed));
    }

    #[test]
    fn test_peak_tracks_new_highs() {
        let mut gate = DrawdownGate::new(dec!(10), dec!(2));
        gate.update(dec!(10000));
        gate.update(dec!(12000));
        assert_eq!(gate.peak(), Some(dec!(12000)));
        // 10,700 is 10.8% below the new peak.
        assert!(gate.update(dec!(10700)).paused);
    }

    #[test]
    fn test_seeded_peak() {
        let mut gate = DrawdownGate::new(dec!(10), dec!(2)).with_peak(dec!(10000));
        assert!(gate.update(dec!(8900)).paused);
    }
}
