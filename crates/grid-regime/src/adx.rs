//! Incremental average directional index.

/// Wilder-smoothed ADX fed one bar at a time.
///
/// TR, +DM and -DM are seeded with a simple average over the first `period`
/// deltas and smoothed with `(prev * (n - 1) + x) / n` afterwards. DX is
/// seeded the same way over the following `period` values, so the ADX
/// becomes available after `2 * period` bars. Until then [`WilderAdx::next`]
/// returns 0.
#[derive(Debug, Clone)]
pub struct WilderAdx {
    period: usize,
    prev: Option<(f64, f64, f64)>,
    smooth_tr: f64,
    smooth_pos_dm: f64,
    smooth_neg_dm: f64,
    adx: f64,
    /// Number of deltas seen (bars minus one).
    deltas: usize,
}

impl WilderAdx {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev: None,
            smooth_tr: 0.0,
            smooth_pos_dm: 0.0,
            smooth_neg_dm: 0.0,
            adx: 0.0,
            deltas: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.deltas >= 2 * self.period - 1
    }

    /// Current ADX value, 0 until ready.
    pub fn value(&self) -> f64 {
        if self.is_ready() {
            self.adx
        } else {
            0.0
        }
    }

    pub fn next(&mut self, high: f64, low: f64, close: f64) -> f64 {
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return 0.0;
        };

        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        let up = high - prev_high;
        let down = prev_low - low;
        let pos_dm = if up > down && up > 0.0 { up } else { 0.0 };
        let neg_dm = if down > up && down > 0.0 { down } else { 0.0 };

        self.deltas += 1;
        let n = self.period as f64;

        if self.deltas <= self.period {
            self.smooth_tr += tr / n;
            self.smooth_pos_dm += pos_dm / n;
            self.smooth_neg_dm += neg_dm / n;
            if self.deltas < self.period {
                return 0.0;
            }
        } else {
            self.smooth_tr = (self.smooth_tr * (n - 1.0) + tr) / n;
            self.smooth_pos_dm = (self.smooth_pos_dm * (n - 1.0) + pos_dm) / n;
            self.smooth_neg_dm = (self.smooth_neg_dm * (n - 1.0) + neg_dm) / n;
        }

        let dx = self.dx();
        let dx_index = self.deltas - self.period + 1;
        if dx_index <= self.period {
            self.adx += dx / n;
        } else {
            self.adx = (self.adx * (n - 1.0) + dx) / n;
        }

        self.value()
    }

    fn dx(&self) -> f64 {
        if self.smooth_tr <= 0.0 {
            return 0.0;
        }
        let pos_di = self.smooth_pos_dm / self.smooth_tr * 100.0;
        let neg_di = self.smooth_neg_dm / self.smooth_tr * 100.0;
        let sum = pos_di + neg_di;
        if sum <= 0.0 {
            0.0
        } else {
            (pos_di - neg_di).abs() / sum * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_before_two_periods() {
        let mut adx = WilderAdx::new(3);
        for i in 0..5 {
            let base = 100.0 + i as f64;
            assert_eq!(adx.next(base + 1.0, base - 1.0, base), 0.0);
        }
        assert!(!adx.is_ready());
        let base = 105.0;
        assert!(adx.next(base + 1.0, base - 1.0, base) > 0.0);
        assert!(adx.is_ready());
    }

    #[test]
    fn test_steady_uptrend_reads_strong() {
        let mut adx = WilderAdx::new(14);
        let mut value = 0.0;
        for i in 0..60 {
            let base = 100.0 * (1.0 + 0.005 * i as f64);
            value = adx.next(base * 1.002, base * 0.998, base);
        }
        assert!(value > 90.0, "adx {value}");
    }

    #[test]
    fn test_flat_market_reads_weak() {
        let mut adx = WilderAdx::new(14);
        let mut value = 0.0;
        for i in 0..60 {
            let base = if i % 2 == 0 { 100.0 } else { 100.5 };
            value = adx.next(base + 0.5, base - 0.5, base);
        }
        assert!(value < 20.0, "adx {value}");
    }
}
