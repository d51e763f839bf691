/// Domain-specific error types for the journal service.
/// Core computations never fail; everything here comes from validation,
/// configuration or the storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("store API error: {status} {body}")]
    StoreApi { status: u16, body: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("trade not found: {0}")]
    NotFound(String),
}

impl JournalError {
    /// True when the failure happened at the storage boundary.
    #[inline]
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            JournalError::Network(_) | JournalError::StoreApi { .. } | JournalError::Database(_)
        )
    }
}

impl From<reqwest::Error> for JournalError {
    fn from(e: reqwest::Error) -> Self {
        JournalError::Network(e.to_string())
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(e: rusqlite::Error) -> Self {
        JournalError::Database(e.to_string())
    }
}

pub type JournalResult<T> = Result<T, JournalError>;
