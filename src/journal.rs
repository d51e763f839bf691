use crate::config::AppConfig;
use crate::errors::{JournalError, JournalResult};
use crate::fees::FeeSchedule;
use crate::money::format_idr;
use crate::normalize::{self, RowDefaults};
use crate::pnl::ProfitLoss;
use crate::repository::TradeRepository;
use crate::store::Store;
use crate::trade::{self, TradeInput, TradeRecord};
use chrono::{FixedOffset, Offset, Utc};

/// A persisted trade together with the fee and P/L breakdown that produced it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Recorded {
    pub trade: TradeRecord,
    pub calculation: ProfitLoss,
}

/// Journal service: the only writer of the trade repository.
///
/// Every write is applied to the local collection first and rolled back if
/// the store rejects it. Callers serialize access (the server keeps the
/// journal behind a mutex held across the store round-trip), so at most one
/// write is ever in flight.
pub struct Journal {
    store: Store,
    repo: TradeRepository,
    schedule: FeeSchedule,
    default_strategy: String,
    utc_offset: FixedOffset,
}

impl Journal {
    pub fn new(store: Store, schedule: FeeSchedule, default_strategy: &str) -> Self {
        Self {
            store,
            repo: TradeRepository::new(),
            schedule,
            default_strategy: default_strategy.to_string(),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn from_config(cfg: &AppConfig, store: Store) -> Self {
        Self::new(store, FeeSchedule::new(cfg.fee_rate_percent), &cfg.default_strategy)
            .with_utc_offset(cfg.utc_offset)
    }

    pub fn trades(&self) -> &[TradeRecord] {
        self.repo.list()
    }

    pub fn get(&self, id: &str) -> Option<&TradeRecord> {
        self.repo.get(id)
    }

    pub fn schedule(&self) -> &FeeSchedule {
        &self.schedule
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Default fee the form shows while the fee field is blank.
    pub fn fee_preview(&self, entry_price: f64, exit_price: f64, lot_size: u32) -> f64 {
        self.schedule.fee_for(entry_price, exit_price, lot_size)
    }

    /// Replace the local collection with a fresh read of the store.
    pub async fn load(&mut self) -> JournalResult<usize> {
        let rows = self.store.fetch_rows().await?;
        let defaults = RowDefaults {
            today: Utc::now().with_timezone(&self.utc_offset).date_naive(),
            strategy: &self.default_strategy,
            utc_offset: self.utc_offset,
        };
        let records = normalize::normalize_rows(&rows, &defaults);

        let drifted = records
            .iter()
            .filter(|r| normalize::profit_loss_drift(r, &self.schedule).abs() >= 0.01)
            .count();
        if drifted > 0 {
            tracing::debug!(drifted, "stored P/L differs from recomputed P/L");
        }

        self.repo.replace_all(records);
        let count = self.repo.len();
        tracing::info!(count, store = self.store.name(), "journal loaded");
        Ok(count)
    }

    pub async fn create(&mut self, input: TradeInput) -> JournalResult<Recorded> {
        let (record, calc) =
            input.into_record(trade::generate_id(), &self.schedule, &self.default_strategy)?;

        self.repo.upsert(record.clone());
        if let Err(e) = self.store.append(&record).await {
            self.repo.remove_by_id(&record.id);
            tracing::warn!(id = %record.id, error = %e, "create failed, local insert rolled back");
            return Err(e);
        }

        tracing::info!(
            id = %record.id,
            symbol = %record.symbol,
            fee = %format_idr(calc.total_fee),
            pnl = %format_idr(calc.profit_loss),
            "trade recorded"
        );
        Ok(Recorded { trade: record, calculation: calc })
    }

    /// Full-record replace of an existing trade.
    pub async fn update(&mut self, id: &str, input: TradeInput) -> JournalResult<Recorded> {
        if self.get(id).is_none() {
            return Err(JournalError::NotFound(id.to_string()));
        }
        let (record, calc) =
            input.into_record(id.to_string(), &self.schedule, &self.default_strategy)?;

        let previous = self.repo.upsert(record.clone());
        if let Err(e) = self.store.update(&record).await {
            if let Some(prev) = previous {
                self.repo.upsert(prev);
            }
            tracing::warn!(id, error = %e, "update failed, previous version restored");
            return Err(e);
        }

        tracing::info!(
            id,
            fee = %format_idr(calc.total_fee),
            pnl = %format_idr(calc.profit_loss),
            "trade updated"
        );
        Ok(Recorded { trade: record, calculation: calc })
    }

    pub async fn delete(&mut self, id: &str) -> JournalResult<TradeRecord> {
        let (index, removed) = self
            .repo
            .remove_by_id(id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;

        if let Err(e) = self.store.delete(id).await {
            self.repo.restore_at(index, removed);
            tracing::warn!(id, error = %e, "delete failed, record restored");
            return Err(e);
        }

        tracing::info!(id, symbol = %removed.symbol, "trade deleted");
        Ok(removed)
    }
}
