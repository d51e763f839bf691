use crate::config::AppConfig;
use crate::journal::Journal;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application shared state.
///
/// The journal sits behind an async mutex. Write handlers hold the guard
/// across the store round-trip, which keeps at most one write in flight.
pub struct AppState {
    pub config: AppConfig,
    pub journal: Mutex<Journal>,
}

impl AppState {
    pub fn new(config: AppConfig, journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            config,
            journal: Mutex::new(journal),
        })
    }
}
