pub mod sheets;
pub mod sqlite;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::JournalResult;
use crate::normalize::RawRow;
use crate::trade::TradeRecord;
use sheets::SheetsClient;
use sqlite::SqliteStore;

/// Storage collaborator. Owns durability; the journal only hands it
/// finished records and ids.
#[derive(Clone)]
pub enum Store {
    Sheets(SheetsClient),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn from_config(cfg: &AppConfig) -> JournalResult<Self> {
        match &cfg.store_backend {
            StoreBackend::Sheets { url } => Ok(Store::Sheets(SheetsClient::new(url))),
            StoreBackend::Sqlite => Ok(Store::Sqlite(SqliteStore::open(&cfg.data_dir)?)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Store::Sheets(_) => "sheets",
            Store::Sqlite(_) => "sqlite",
        }
    }

    /// Every persisted row, header first.
    pub async fn fetch_rows(&self) -> JournalResult<Vec<RawRow>> {
        match self {
            Store::Sheets(c) => c.get_data().await,
            Store::Sqlite(db) => db.fetch_rows(),
        }
    }

    pub async fn append(&self, record: &TradeRecord) -> JournalResult<()> {
        match self {
            Store::Sheets(c) => c.add(record).await,
            Store::Sqlite(db) => db.insert(record),
        }
    }

    pub async fn update(&self, record: &TradeRecord) -> JournalResult<()> {
        match self {
            Store::Sheets(c) => c.update(record).await,
            Store::Sqlite(db) => db.update(record),
        }
    }

    pub async fn delete(&self, id: &str) -> JournalResult<()> {
        match self {
            Store::Sheets(c) => c.delete(id).await,
            Store::Sqlite(db) => db.delete(id),
        }
    }
}
