use crate::analytics::{self, TradeFilter};
use crate::errors::JournalError;
use crate::state::AppState;
use crate::trade::{self, TradeInput};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};
use std::sync::Arc;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(serde::Deserialize)]
pub struct FeePreviewQuery {
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: Option<i64>,
}

fn error_response(e: JournalError) -> ApiResponse {
    let status = match &e {
        JournalError::Validation(_) => StatusCode::BAD_REQUEST,
        JournalError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_store_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// Malformed or incomplete bodies are validation failures, not axum's 422.
fn trade_input(body: Result<Json<TradeInput>, JsonRejection>) -> Result<TradeInput, ApiResponse> {
    body.map(|Json(input)| input)
        .map_err(|rej| error_response(JournalError::Validation(rej.body_text())))
}

/// GET /api/trades -- filtered trade list
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TradeFilter>,
) -> Json<Value> {
    let journal = state.journal.lock().await;
    let trades = analytics::apply_filter(journal.trades(), &filter);
    Json(json!({ "trades": trades }))
}

/// POST /api/trades -- record a new trade
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TradeInput>, JsonRejection>,
) -> ApiResponse {
    let input = match trade_input(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let mut journal = state.journal.lock().await;
    match journal.create(input).await {
        Ok(recorded) => (StatusCode::CREATED, Json(json!(recorded))),
        Err(e) => error_response(e),
    }
}

/// PUT /api/trades/{id} -- full-record replace
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<TradeInput>, JsonRejection>,
) -> ApiResponse {
    let input = match trade_input(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let mut journal = state.journal.lock().await;
    match journal.update(&id, input).await {
        Ok(recorded) => (StatusCode::OK, Json(json!(recorded))),
        Err(e) => error_response(e),
    }
}

/// DELETE /api/trades/{id}
pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResponse {
    let mut journal = state.journal.lock().await;
    match journal.delete(&id).await {
        Ok(trade) => (StatusCode::OK, Json(json!({ "deleted": trade.id }))),
        Err(e) => error_response(e),
    }
}

/// POST /api/reload -- re-read everything from the store
pub async fn reload(State(state): State<Arc<AppState>>) -> ApiResponse {
    let mut journal = state.journal.lock().await;
    match journal.load().await {
        Ok(count) => (StatusCode::OK, Json(json!({ "count": count }))),
        Err(e) => error_response(e),
    }
}

/// GET /api/summary -- totals and win rate for the home view
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<Value> {
    let journal = state.journal.lock().await;
    Json(json!(analytics::summarize(journal.trades())))
}

/// GET /api/performance/symbols
pub async fn get_symbol_performance(State(state): State<Arc<AppState>>) -> Json<Value> {
    let journal = state.journal.lock().await;
    let table = analytics::performance_table(analytics::by_symbol(journal.trades()));
    Json(json!({ "symbols": table }))
}

/// GET /api/performance/strategies
pub async fn get_strategy_performance(State(state): State<Arc<AppState>>) -> Json<Value> {
    let journal = state.journal.lock().await;
    let table = analytics::performance_table(analytics::by_strategy(journal.trades()));
    Json(json!({ "strategies": table }))
}

/// GET /api/distribution -- trade counts per P/L band
pub async fn get_distribution(State(state): State<Arc<AppState>>) -> Json<Value> {
    let journal = state.journal.lock().await;
    let bands: Vec<Value> = analytics::distribution(journal.trades())
        .iter()
        .map(|(band, count)| json!({ "band": band, "label": band.label(), "count": count }))
        .collect();
    Json(json!({ "bands": bands }))
}

/// GET /api/monthly -- P/L per entry month
pub async fn get_monthly(State(state): State<Arc<AppState>>) -> Json<Value> {
    let journal = state.journal.lock().await;
    let series: Vec<Value> = analytics::monthly_profit(journal.trades())
        .into_iter()
        .map(|(month, pnl)| json!({ "month": month, "pnl": pnl }))
        .collect();
    Json(json!({ "series": series }))
}

/// GET /api/fee-preview -- default fee for a blank fee field
pub async fn get_fee_preview(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FeePreviewQuery>, QueryRejection>,
) -> ApiResponse {
    let params = match query {
        Ok(Query(p)) => p,
        Err(rej) => return error_response(JournalError::Validation(rej.body_text())),
    };
    let prices = trade::check_price("entry_price", params.entry_price)
        .and_then(|_| trade::check_price("exit_price", params.exit_price));
    if let Err(e) = prices {
        return error_response(e);
    }
    let lot = params.lot_size.unwrap_or(1);
    if lot < 1 {
        return error_response(JournalError::Validation(format!(
            "lot size must be at least 1, got {lot}"
        )));
    }
    let lot = u32::try_from(lot).unwrap_or(u32::MAX);
    let journal = state.journal.lock().await;
    let fee = journal.fee_preview(params.entry_price, params.exit_price, lot);
    (
        StatusCode::OK,
        Json(json!({
            "fee": fee,
            "rate_percent": journal.schedule().rate_percent,
            "default_strategy": state.config.default_strategy,
        })),
    )
}
