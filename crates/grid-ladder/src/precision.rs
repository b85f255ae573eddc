//! Value-precision guard.
//!
//! Last gate before a rung becomes eligible for reconciliation:
//! - LONG (buy) prices floor to tick, SHORT (sell) prices ceil to tick
//! - quantities floor to step
//! - rungs with zero quantity, non-positive price or notional below the
//!   instrument minimum are dropped
//!
//! Quantizing an already-quantized ladder is a no-op.

use std::collections::HashSet;

use grid_core::InstrumentSpec;
use tracing::debug;

use crate::error::{LadderError, LadderResult};
use crate::ladder::{Ladder, Ladders, Rung};

/// Ladders that have passed the precision guard.
///
/// Only [`quantize`] constructs this type, so holding one means every rung
/// sits on the instrument grid and meets the minimum notional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedLadders(Ladders);

impl QuantizedLadders {
    pub fn ladders(&self) -> &Ladders {
        &self.0
    }

    pub fn into_ladders(self) -> Ladders {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rung> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-check every rung against `instrument`.
    pub fn verify(&self, instrument: &InstrumentSpec) -> LadderResult<()> {
        for ladder in [&self.0.long, &self.0.short] {
            let mut levels = HashSet::new();
            for rung in ladder.iter() {
                if rung.side != ladder.side() {
                    return Err(violation(rung, "side does not match ladder"));
                }
                if !levels.insert(rung.level) {
                    return Err(violation(rung, "duplicate level"));
                }
                if !rung.price.is_positive() || !rung.qty.is_positive() {
                    return Err(violation(rung, "non-positive price or quantity"));
                }
                if !instrument.is_quantized(rung.price, rung.qty) {
                    return Err(violation(rung, "off the tick/step grid"));
                }
                if !instrument.meets_min_notional(rung.price, rung.qty) {
                    return Err(violation(rung, "below minimum notional"));
                }
            }
        }
        Ok(())
    }
}

fn violation(rung: &Rung, what: &str) -> LadderError {
    LadderError::InvariantViolation(format!(
        "rung {} price={} qty={}: {what}",
        rung.key(),
        rung.price,
        rung.qty
    ))
}

/// Quantize every rung and drop the ones that do not survive.
pub fn quantize(ladders: Ladders, instrument: &InstrumentSpec) -> QuantizedLadders {
    let Ladders {
        long,
        short,
        regime,
    } = ladders;
    QuantizedLadders(Ladders {
        long: quantize_ladder(long, instrument),
        short: quantize_ladder(short, instrument),
        regime,
    })
}

fn quantize_ladder(ladder: Ladder, instrument: &InstrumentSpec) -> Ladder {
    let side = ladder.side();
    let mut out = Ladder::new(side);
    for rung in ladder.iter() {
        let price = instrument.round_price_passive(rung.price, side.entry_side());
        let qty = instrument.round_qty(rung.qty);

        if !price.is_positive() || !qty.is_positive() {
            debug!(key = %rung.key(), %price, %qty, "Rung dropped: rounds to zero");
            continue;
        }
        if !instrument.meets_min_notional(price, qty) {
            debug!(
                key = %rung.key(),
                notional = %qty.notional(price),
                min_notional = %instrument.min_notional,
                "Rung dropped: below minimum notional"
            );
            continue;
        }
        out.push(Rung {
            price,
            qty,
            ..*rung
        });
    }
    out
}
