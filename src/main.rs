mod analytics;
mod config;
mod errors;
mod fees;
mod journal;
mod money;
mod normalize;
mod pnl;
mod repository;
mod server;
mod state;
mod store;
mod trade;

use crate::journal::Journal;
use crate::state::AppState;
use crate::store::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("trade journal starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let store = match Store::from_config(&cfg) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("store init error: {e}");
            std::process::exit(1);
        }
    };

    let mut journal = Journal::from_config(&cfg, store);
    // An unreachable store at boot still serves the dashboard; /api/reload retries.
    if let Err(e) = journal.load().await {
        tracing::error!("initial load failed, starting with an empty journal: {e}");
    }

    tracing::info!(
        store = journal.store_name(),
        fee_rate = cfg.fee_rate_percent,
        default_strategy = %cfg.default_strategy,
        "journal ready"
    );

    let port = cfg.server_port;
    let dashboard_dir = cfg.dashboard_dir.clone();
    let app_state = AppState::new(cfg, journal);
    let app = server::router(app_state, &dashboard_dir);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
