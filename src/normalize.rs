//! Record normalizer: loosely-typed persisted rows into canonical trades.
//!
//! Rows come back from the storage collaborator as positional JSON values
//! (strings, numbers, nulls, or short rows). Every field degrades to a
//! documented fallback instead of failing, so one bad row never aborts a
//! load.
//!
//! Fee-unit reconciliation: a stored fee strictly between 0 and 1 is read
//! as a legacy percentage of buy + sell notional and converted to an
//! absolute amount. This cannot tell a real 0.50 fee apart from 0.5%; the
//! heuristic is kept as-is and pinned by tests.

use crate::fees::{self, FeeSchedule};
use crate::money::round_currency;
use crate::pnl;
use crate::trade::{self, TradeRecord};
use chrono::{FixedOffset, NaiveDate};
use serde_json::Value;

pub type RawRow = Vec<Value>;

pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

const COL_ID: usize = 0;
const COL_ENTRY_DATE: usize = 1;
const COL_EXIT_DATE: usize = 2;
const COL_SYMBOL: usize = 3;
const COL_ENTRY_PRICE: usize = 4;
const COL_EXIT_PRICE: usize = 5;
const COL_LOT: usize = 6;
const COL_FEE: usize = 7;
const COL_STRATEGY: usize = 8;
const COL_NOTE: usize = 9;
const COL_PNL: usize = 10;

static MISSING: Value = Value::Null;

/// Fallbacks and the journal's local offset, fixed for one load.
#[derive(Debug, Clone, Copy)]
pub struct RowDefaults<'a> {
    pub today: NaiveDate,
    pub strategy: &'a str,
    /// Timestamps are converted to this offset before taking the date.
    pub utc_offset: FixedOffset,
}

/// Normalize a whole fetch result. The first row is a header and dropped.
pub fn normalize_rows(rows: &[RawRow], defaults: &RowDefaults<'_>) -> Vec<TradeRecord> {
    rows.iter()
        .skip(1)
        .map(|row| normalize_row(row, defaults))
        .collect()
}

/// Normalize one persisted row. Never fails.
pub fn normalize_row(row: &[Value], defaults: &RowDefaults<'_>) -> TradeRecord {
    let field = |i: usize| row.get(i).unwrap_or(&MISSING);

    let entry_price = parse_number(field(COL_ENTRY_PRICE)).unwrap_or(0.0);
    let exit_price = parse_number(field(COL_EXIT_PRICE)).unwrap_or(0.0);
    let lot_size = parse_lot(field(COL_LOT));
    let stored_fee = parse_number(field(COL_FEE)).unwrap_or(0.0);

    TradeRecord {
        id: parse_text(field(COL_ID)).unwrap_or_else(trade::generate_id),
        entry_date: parse_date(field(COL_ENTRY_DATE), defaults.utc_offset).unwrap_or(defaults.today),
        exit_date: parse_date(field(COL_EXIT_DATE), defaults.utc_offset).unwrap_or(defaults.today),
        symbol: parse_text(field(COL_SYMBOL))
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
        entry_price,
        exit_price,
        lot_size,
        broker_fee: reconcile_fee(stored_fee, entry_price, exit_price, lot_size),
        strategy: parse_text(field(COL_STRATEGY)).unwrap_or_else(|| defaults.strategy.to_string()),
        note: parse_text(field(COL_NOTE)),
        profit_loss: parse_number(field(COL_PNL)).unwrap_or(0.0),
    }
}

/// Convert a legacy percentage fee (0 < fee < 1) into an absolute amount.
/// Anything else is already absolute and passes through unchanged.
#[inline]
pub fn reconcile_fee(stored_fee: f64, entry_price: f64, exit_price: f64, lot_size: u32) -> f64 {
    if stored_fee > 0.0 && stored_fee < 1.0 {
        let (buy, sell) = fees::notionals(entry_price, exit_price, lot_size);
        round_currency((buy + sell) * (stored_fee / 100.0))
    } else {
        stored_fee
    }
}

/// Stored P/L minus the P/L recomputed from the record's own inputs.
/// Non-zero means the row was edited out-of-band; loads never correct it.
pub fn profit_loss_drift(record: &TradeRecord, schedule: &FeeSchedule) -> f64 {
    let recomputed = pnl::compute_profit_loss(
        record.entry_price,
        record.exit_price,
        record.lot_size,
        Some(record.broker_fee),
        schedule,
    );
    record.profit_loss - recomputed.profit_loss
}

// ── Field parsers ──

fn parse_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite number from a JSON number or the leading numeric part of text.
fn parse_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(s),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Lot count; anything unparsable or below 1 becomes 1.
fn parse_lot(v: &Value) -> u32 {
    let lot = match v {
        Value::Number(n) => n.as_f64().map(f64::trunc),
        Value::String(s) => leading_integer(s).map(|i| i as f64),
        _ => None,
    };
    match lot {
        Some(l) if l.is_finite() && l >= 1.0 => l.min(u32::MAX as f64) as u32,
        _ => 1,
    }
}

/// Calendar date from RFC 3339 text (read in the journal's offset), or the
/// `YYYY-MM-DD` prefix of anything else.
///
/// The spreadsheet serializes date cells as UTC instants, so a local
/// 1 March arrives as `2024-02-29T17:00:00.000Z` under +07:00.
fn parse_date(v: &Value, utc_offset: FixedOffset) -> Option<NaiveDate> {
    let s = v.as_str()?.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&utc_offset).date_naive());
    }
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Longest prefix of `s` (after leading whitespace) that reads as a decimal.
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    // Optional exponent, only if followed by at least one digit.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}
