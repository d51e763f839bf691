use crate::errors::{JournalError, JournalResult};
use crate::fees::FeeSchedule;
use crate::pnl::{self, ProfitLoss};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ── Canonical trade record ──

/// One closed stock trade. `broker_fee` is always an absolute amount and
/// `profit_loss` is always produced by the P/L calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: u32,
    pub broker_fee: f64,
    pub strategy: String,
    pub note: Option<String>,
    pub profit_loss: f64,
}

impl TradeRecord {
    /// Positional row in storage order:
    /// id, entry, exit, symbol, entry price, exit price, lot, fee, strategy, note, P/L.
    pub fn to_raw_row(&self) -> Vec<Value> {
        vec![
            json!(self.id),
            json!(self.entry_date.format("%Y-%m-%d").to_string()),
            json!(self.exit_date.format("%Y-%m-%d").to_string()),
            json!(self.symbol),
            json!(self.entry_price),
            json!(self.exit_price),
            json!(self.lot_size),
            json!(self.broker_fee),
            json!(self.strategy),
            json!(self.note.as_deref().unwrap_or("")),
            json!(self.profit_loss),
        ]
    }

    /// Entry month as `YYYY-MM`.
    #[inline]
    pub fn entry_month(&self) -> String {
        self.entry_date.format("%Y-%m").to_string()
    }
}

/// Header row written ahead of the data rows by the storage collaborators.
pub const RAW_HEADER: [&str; 11] = [
    "id",
    "entryDate",
    "exitDate",
    "symbol",
    "entryPrice",
    "exitPrice",
    "lotSize",
    "fee",
    "strategyTag",
    "note",
    "profitLoss",
];

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Create / edit input ──

/// Prices feed the fee engine, which is only defined for finite values >= 0.
pub fn check_price(name: &str, price: f64) -> JournalResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(JournalError::Validation(format!(
            "{name} must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

/// Fee field as submitted: a JSON number or the raw text of a form field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeeField {
    Amount(f64),
    Text(String),
}

impl FeeField {
    #[inline]
    pub fn manual_fee(&self) -> Option<f64> {
        match self {
            FeeField::Amount(f) => Some(*f),
            FeeField::Text(s) => pnl::parse_manual_fee(s),
        }
    }
}

/// Body of a create or edit request. Edits replace the whole record.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeInput {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: i64,
    #[serde(default)]
    pub broker_fee: Option<FeeField>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl TradeInput {
    /// Checks the calculator's preconditions. Returns the lot size as a
    /// positive count.
    pub fn validate(&self) -> JournalResult<u32> {
        if self.symbol.trim().is_empty() {
            return Err(JournalError::Validation("symbol is required".into()));
        }
        if self.exit_date < self.entry_date {
            return Err(JournalError::Validation(format!(
                "exit date {} is before entry date {}",
                self.exit_date, self.entry_date
            )));
        }
        check_price("entry_price", self.entry_price)?;
        check_price("exit_price", self.exit_price)?;
        if self.lot_size < 1 {
            return Err(JournalError::Validation(format!(
                "lot size must be at least 1, got {}",
                self.lot_size
            )));
        }
        u32::try_from(self.lot_size)
            .map_err(|_| JournalError::Validation(format!("lot size too large: {}", self.lot_size)))
    }

    /// Validate, compute P/L and build the canonical record under `id`.
    pub fn into_record(
        self,
        id: String,
        schedule: &FeeSchedule,
        default_strategy: &str,
    ) -> JournalResult<(TradeRecord, ProfitLoss)> {
        let lot_size = self.validate()?;
        let manual_fee = self.broker_fee.as_ref().and_then(FeeField::manual_fee);
        let calc = pnl::compute_profit_loss(
            self.entry_price,
            self.exit_price,
            lot_size,
            manual_fee,
            schedule,
        );

        let strategy = self
            .strategy
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_strategy.to_string());

        let record = TradeRecord {
            id,
            entry_date: self.entry_date,
            exit_date: self.exit_date,
            symbol: self.symbol.trim().to_uppercase(),
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            lot_size,
            broker_fee: calc.total_fee,
            strategy,
            note: self.note.filter(|n| !n.trim().is_empty()),
            profit_loss: calc.profit_loss,
        };
        Ok((record, calc))
    }
}
