//! Default broker fee schedule.
//!
//! fee = round((entry * shares + exit * shares) * rate / 100)
//!
//! where shares = lot_size * SHARES_PER_LOT. Pure function, no side effects.

use crate::money::round_currency;

/// One lot is a fixed 100 shares.
pub const SHARES_PER_LOT: f64 = 100.0;

/// Default fee rate in percent of buy + sell notional.
pub const DEFAULT_FEE_RATE_PERCENT: f64 = 0.4026;

/// Fee schedule applied on the default path. Only configuration overrides
/// the rate; a user-entered manual fee bypasses the schedule entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    pub rate_percent: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { rate_percent: DEFAULT_FEE_RATE_PERCENT }
    }
}

impl FeeSchedule {
    pub fn new(rate_percent: f64) -> Self {
        Self { rate_percent }
    }

    #[inline]
    pub fn fee_for(&self, entry_price: f64, exit_price: f64, lot_size: u32) -> f64 {
        compute_default_fee(entry_price, exit_price, lot_size, self.rate_percent)
    }
}

/// Buy and sell notional for a round trip of `lot_size` lots.
#[inline]
pub fn notionals(entry_price: f64, exit_price: f64, lot_size: u32) -> (f64, f64) {
    let shares = lot_size as f64 * SHARES_PER_LOT;
    (entry_price * shares, exit_price * shares)
}

/// Default broker fee in absolute currency units.
#[inline]
pub fn compute_default_fee(
    entry_price: f64,
    exit_price: f64,
    lot_size: u32,
    fee_rate_percent: f64,
) -> f64 {
    let (buy, sell) = notionals(entry_price, exit_price, lot_size);
    round_currency((buy + sell) * fee_rate_percent / 100.0)
}
