pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use std::path::Path;
use std::sync::Arc;

/// JSON API plus the static dashboard as fallback.
pub fn router(state: Arc<AppState>, dashboard_dir: &Path) -> Router {
    Router::new()
        .route("/api/trades", get(routes::list_trades).post(routes::create_trade))
        .route(
            "/api/trades/{id}",
            put(routes::update_trade).delete(routes::delete_trade),
        )
        .route("/api/reload", post(routes::reload))
        .route("/api/summary", get(routes::get_summary))
        .route("/api/performance/symbols", get(routes::get_symbol_performance))
        .route("/api/performance/strategies", get(routes::get_strategy_performance))
        .route("/api/distribution", get(routes::get_distribution))
        .route("/api/monthly", get(routes::get_monthly))
        .route("/api/fee-preview", get(routes::get_fee_preview))
        .fallback_service(
            tower_http::services::ServeDir::new(dashboard_dir)
                .fallback(tower_http::services::ServeFile::new(dashboard_dir.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::journal::Journal;
    use crate::store::sqlite::SqliteStore;
    use crate::store::Store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn app() -> Router {
        let vars: HashMap<&str, &str> = HashMap::from([("STORE_BACKEND", "sqlite")]);
        let cfg = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        let store = Store::Sqlite(SqliteStore::open_in_memory().unwrap());
        let journal = Journal::from_config(&cfg, store);
        let dashboard = cfg.dashboard_dir.clone();
        router(AppState::new(cfg, journal), &dashboard)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn trade_body(symbol: &str, exit_price: f64, fee: Value) -> Value {
        json!({
            "entry_date": "2024-03-01",
            "exit_date": "2024-03-04",
            "symbol": symbol,
            "entry_price": 1000,
            "exit_price": exit_price,
            "lot_size": 1,
            "broker_fee": fee,
            "strategy": "Swing"
        })
    }

    #[tokio::test]
    async fn test_create_list_and_summary() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/trades", Some(trade_body("bbca", 1200.0, json!("")))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["trade"]["broker_fee"], json!(886.0));
        assert_eq!(body["trade"]["profit_loss"], json!(19114.0));
        assert_eq!(body["calculation"]["total_fee"], json!(886.0));
        assert_eq!(body["calculation"]["sell_notional"], json!(120000.0));

        send(&app, "POST", "/api/trades", Some(trade_body("tlkm", 900.0, json!(100)))).await;

        let (_, list) = send(&app, "GET", "/api/trades?symbol=bb", None).await;
        assert_eq!(list["trades"].as_array().unwrap().len(), 1);

        let (_, summary) = send(&app, "GET", "/api/summary", None).await;
        assert_eq!(summary["total_trades"], json!(2));
        assert_eq!(summary["wins"], json!(1));
        assert_eq!(summary["losses"], json!(1));
        assert_eq!(summary["win_rate"], json!(50.0));

        let (_, perf) = send(&app, "GET", "/api/performance/symbols", None).await;
        assert_eq!(perf["symbols"][0]["key"], json!("BBCA"));

        let (_, dist) = send(&app, "GET", "/api/distribution", None).await;
        assert_eq!(dist["bands"].as_array().unwrap().len(), 6);
        assert_eq!(dist["bands"][2]["band"], json!("small_loss"));
        assert_eq!(dist["bands"][2]["count"], json!(1));

        let (_, monthly) = send(&app, "GET", "/api/monthly", None).await;
        assert_eq!(monthly["series"][0]["month"], json!("2024-03"));
    }

    #[tokio::test]
    async fn test_update_delete_and_errors() {
        let app = app();
        let (_, created) = send(&app, "POST", "/api/trades", Some(trade_body("bbca", 1200.0, Value::Null))).await;
        let id = created["trade"]["id"].as_str().unwrap().to_string();

        let (status, updated) =
            send(&app, "PUT", &format!("/api/trades/{id}"), Some(trade_body("bbca", 1100.0, json!(500)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["trade"]["profit_loss"], json!(9500.0));

        let mut bad = trade_body("bbca", 1100.0, Value::Null);
        bad["exit_date"] = json!("2024-02-01");
        let (status, err) = send(&app, "PUT", &format!("/api/trades/{id}"), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().contains("exit date"));

        let (status, _) = send(&app, "DELETE", &format!("/api/trades/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", &format!("/api/trades/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, reloaded) = send(&app, "POST", "/api/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reloaded["count"], json!(0));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app();
        let mut missing_symbol = trade_body("bbca", 1200.0, Value::Null);
        missing_symbol.as_object_mut().unwrap().remove("symbol");
        let (status, err) = send(&app, "POST", "/api/trades", Some(missing_symbol)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().contains("symbol"));

        let mut text_price = trade_body("bbca", 1200.0, Value::Null);
        text_price["entry_price"] = json!("1000");
        let (status, err) = send(&app, "PUT", "/api/trades/some-id", Some(text_price)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());

        let (_, list) = send(&app, "GET", "/api/trades", None).await;
        assert!(list["trades"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fee_preview() {
        let app = app();
        let (status, body) =
            send(&app, "GET", "/api/fee-preview?entry_price=1000&exit_price=1200&lot_size=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fee"], json!(886.0));

        let (status, _) =
            send(&app, "GET", "/api/fee-preview?entry_price=1000&exit_price=1200&lot_size=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, err) =
            send(&app, "GET", "/api/fee-preview?entry_price=-1000&exit_price=0&lot_size=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().contains("entry_price"));

        let (status, _) =
            send(&app, "GET", "/api/fee-preview?entry_price=1000&exit_price=inf", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, err) = send(&app, "GET", "/api/fee-preview?entry_price=abc&exit_price=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].is_string());
    }
}
