use crate::errors::{JournalError, JournalResult};
use crate::fees::DEFAULT_FEE_RATE_PERCENT;
use chrono::FixedOffset;
use std::path::PathBuf;

/// Which storage collaborator owns durability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Remote spreadsheet API reached over HTTP.
    Sheets { url: String },
    /// Local SQLite file under `data_dir`.
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub fee_rate_percent: f64,
    pub default_strategy: String,
    /// Offset the journal's calendar dates live in (WIB, +07:00, by default).
    pub utc_offset: FixedOffset,
    pub dashboard_dir: PathBuf,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> JournalResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (process env, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> JournalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let store_backend = match var_or("STORE_BACKEND", "sheets").to_lowercase().as_str() {
            "sheets" => StoreBackend::Sheets {
                url: lookup("SHEETS_API_URL")
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| JournalError::Config("missing env var: SHEETS_API_URL".into()))?,
            },
            "sqlite" => StoreBackend::Sqlite,
            other => {
                return Err(JournalError::Config(format!(
                    "STORE_BACKEND: unknown backend {other:?}"
                )))
            }
        };

        let fee_rate_percent = var_or("FEE_RATE_PERCENT", &DEFAULT_FEE_RATE_PERCENT.to_string())
            .parse::<f64>()
            .map_err(|e| JournalError::Config(format!("FEE_RATE_PERCENT: {e}")))?;
        if !fee_rate_percent.is_finite() || fee_rate_percent < 0.0 {
            return Err(JournalError::Config(format!(
                "FEE_RATE_PERCENT: must be a non-negative number, got {fee_rate_percent}"
            )));
        }

        let server_port = var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| JournalError::Config(format!("SERVER_PORT: {e}")))?;

        let default_strategy = var_or("DEFAULT_STRATEGY", "Scalping");
        if default_strategy.trim().is_empty() {
            return Err(JournalError::Config("DEFAULT_STRATEGY: must not be blank".into()));
        }

        let offset_minutes = var_or("UTC_OFFSET_MINUTES", "420")
            .parse::<i32>()
            .map_err(|e| JournalError::Config(format!("UTC_OFFSET_MINUTES: {e}")))?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                JournalError::Config(format!("UTC_OFFSET_MINUTES: out of range: {offset_minutes}"))
            })?;

        Ok(Self {
            store_backend,
            data_dir: PathBuf::from(var_or("DATA_DIR", "data")),
            fee_rate_percent,
            default_strategy,
            utc_offset,
            dashboard_dir: PathBuf::from(var_or("DASHBOARD_DIR", "public")),
            server_port,
        })
    }
}
