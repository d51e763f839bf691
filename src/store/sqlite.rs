use crate::errors::{JournalError, JournalResult};
use crate::normalize::RawRow;
use crate::trade::{TradeRecord, RAW_HEADER};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type DbPool = Arc<Mutex<Connection>>;

const SCHEMA: &str = include_str!("../../migrations/001_init.sql");

/// Local SQLite trade table. Rows come back in the same positional shape
/// the spreadsheet returns, so the normalizer handles both alike.
#[derive(Clone)]
pub struct SqliteStore {
    db: DbPool,
}

impl SqliteStore {
    pub fn open(data_dir: &Path) -> JournalResult<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| JournalError::Database(format!("create dir: {e}")))?;
        let db_path = data_dir.join("trade_journal.db");
        let conn = Connection::open(&db_path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("trade database initialized at {}", db_path.display());
        Ok(Self { db: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> JournalResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { db: Arc::new(Mutex::new(conn)) })
    }

    fn conn(&self) -> JournalResult<std::sync::MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| JournalError::Database(format!("lock poisoned: {e}")))
    }

    /// Header row followed by every stored row, oldest first.
    pub fn fetch_rows(&self) -> JournalResult<Vec<RawRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, entry_date, exit_date, symbol, entry_price, exit_price, lot_size, fee, strategy, note, profit_loss FROM trades ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            (0..RAW_HEADER.len())
                .map(|i| row.get::<_, SqlValue>(i).map(to_json))
                .collect::<Result<RawRow, _>>()
        })?;

        let mut out: Vec<RawRow> = vec![RAW_HEADER.iter().map(|h| Value::from(*h)).collect()];
        for row in rows {
            match row {
                Ok(r) => out.push(r),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable trade row"),
            }
        }
        Ok(out)
    }

    pub fn insert(&self, r: &TradeRecord) -> JournalResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trades (id, entry_date, exit_date, symbol, entry_price, exit_price, lot_size, fee, strategy, note, profit_loss)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                r.id,
                r.entry_date.format("%Y-%m-%d").to_string(),
                r.exit_date.format("%Y-%m-%d").to_string(),
                r.symbol,
                r.entry_price,
                r.exit_price,
                r.lot_size,
                r.broker_fee,
                r.strategy,
                r.note,
                r.profit_loss
            ],
        )?;
        Ok(())
    }

    pub fn update(&self, r: &TradeRecord) -> JournalResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE trades SET entry_date = ?2, exit_date = ?3, symbol = ?4, entry_price = ?5, exit_price = ?6,
                    lot_size = ?7, fee = ?8, strategy = ?9, note = ?10, profit_loss = ?11
             WHERE id = ?1",
            rusqlite::params![
                r.id,
                r.entry_date.format("%Y-%m-%d").to_string(),
                r.exit_date.format("%Y-%m-%d").to_string(),
                r.symbol,
                r.entry_price,
                r.exit_price,
                r.lot_size,
                r.broker_fee,
                r.strategy,
                r.note,
                r.profit_loss
            ],
        )?;
        if changed == 0 {
            return Err(JournalError::NotFound(r.id.clone()));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> JournalResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM trades WHERE id = ?1", rusqlite::params![id])?;
        if changed == 0 {
            return Err(JournalError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Write an arbitrary positional row, bypassing the canonical model.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, row: &[Value]) -> JournalResult<()> {
        let conn = self.conn()?;
        let cells: Vec<SqlValue> = (0..RAW_HEADER.len())
            .map(|i| row.get(i).map(from_json).unwrap_or(SqlValue::Null))
            .collect();
        conn.execute(
            "INSERT INTO trades (id, entry_date, exit_date, symbol, entry_price, exit_price, lot_size, fee, strategy, note, profit_loss)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params_from_iter(cells.iter()),
        )?;
        Ok(())
    }
}

fn to_json(v: SqlValue) -> Value {
    match v {
        SqlValue::Null | SqlValue::Blob(_) => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
    }
}

#[cfg(test)]
fn from_json(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record(id: &str) -> TradeRecord {
        let d = NaiveDate::from_ymd_opt(2024, 4, 8).unwrap();
        TradeRecord {
            id: id.into(),
            entry_date: d,
            exit_date: d,
            symbol: "UNVR".into(),
            entry_price: 2500.0,
            exit_price: 2450.0,
            lot_size: 4,
            broker_fee: 1000.0,
            strategy: "Swing".into(),
            note: None,
            profit_loss: -21_000.0,
        }
    }

    #[test]
    fn test_empty_table_returns_header_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        let rows = store.fetch_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], json!("id"));
    }

    #[test]
    fn test_insert_update_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&record("a")).unwrap();
        store.insert(&record("b")).unwrap();
        assert!(store.insert(&record("a")).is_err(), "duplicate id must fail");

        let mut edited = record("a");
        edited.profit_loss = 5.0;
        store.update(&edited).unwrap();

        let rows = store.fetch_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], json!("a"));
        assert_eq!(rows[1][10], json!(5.0));
        assert_eq!(rows[1][6], json!(4));
        assert_eq!(rows[1][9], Value::Null);

        store.delete("b").unwrap();
        assert_eq!(store.fetch_rows().unwrap().len(), 2);
        assert!(matches!(store.delete("b"), Err(JournalError::NotFound(_))));
        assert!(matches!(store.update(&record("zzz")), Err(JournalError::NotFound(_))));
    }

    #[test]
    fn test_insert_raw_keeps_loose_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_raw(&[json!("legacy"), json!("2023-01-02"), json!(""), json!("bbni"), json!("4500"), json!(4600), json!("2"), json!(0.25)])
            .unwrap();
        let rows = store.fetch_rows().unwrap();
        assert_eq!(rows[1][4], json!("4500"));
        assert_eq!(rows[1][7], json!(0.25));
        assert_eq!(rows[1][10], Value::Null);
    }
}
