//! Profit/loss calculator.
//!
//! P/L = round2(sell_notional - buy_notional - total_fee)
//!
//! where total_fee is the caller's manual fee when it is a finite number
//! strictly above zero, else the schedule's default fee.

use crate::fees::{self, FeeSchedule};
use crate::money::round_decimal;

/// Result of a P/L computation. Stack-allocated.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ProfitLoss {
    pub profit_loss: f64,
    pub total_fee: f64,
    pub buy_notional: f64,
    pub sell_notional: f64,
}

/// Manual fee from raw form text. Blank or non-numeric text is "absent".
pub fn parse_manual_fee(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Combine prices, lot size and fee into a signed P/L figure.
/// A negative result is a loss, never an error. `lot_size >= 1` is the
/// caller's precondition and is not re-checked here.
#[inline]
pub fn compute_profit_loss(
    entry_price: f64,
    exit_price: f64,
    lot_size: u32,
    manual_fee: Option<f64>,
    schedule: &FeeSchedule,
) -> ProfitLoss {
    let (buy_notional, sell_notional) = fees::notionals(entry_price, exit_price, lot_size);

    let total_fee = match manual_fee {
        Some(f) if f.is_finite() && f > 0.0 => f,
        _ => schedule.fee_for(entry_price, exit_price, lot_size),
    };

    ProfitLoss {
        profit_loss: round_decimal(sell_notional - buy_notional - total_fee),
        total_fee,
        buy_notional,
        sell_notional,
    }
}
