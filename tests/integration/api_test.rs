//! Integration tests for the HTTP query API over SQLite

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use price_feed::api::{router, ApiState};
use price_feed::query::QueryService;
use price_feed::store::{NewTrade, SqliteTradeStore, TradeStore};
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn seeded_app(dir: &TempDir) -> Router {
    let store = Arc::new(SqliteTradeStore::open(dir.path().join("api.db"), 4).unwrap());
    let base = Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap();

    for (i, price) in [dec!(10), dec!(8), dec!(12)].into_iter().enumerate() {
        store
            .insert(NewTrade {
                symbol: "BTCUSDT".to_string(),
                price,
                timestamp: base + chrono::Duration::seconds(i as i64),
            })
            .unwrap();
    }

    router(ApiState::new(QueryService::new(store), 2))
}

async fn request(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_statistics_over_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let (status, body) =
        request(seeded_app(&temp_dir), "/statistical_analysis?symbol=BTCUSDT").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["average_price"], 10.0);
    assert_eq!(body["median_price"], 10.0);
    let stddev = body["standard_deviation"].as_f64().unwrap();
    assert!((stddev - 1.63).abs() < 1e-9, "stddev = {stddev}");
    assert_eq!(body["percentage_change"], 50.0);
}

#[tokio::test]
async fn test_history_uses_configured_default_page_size() {
    let temp_dir = TempDir::new().unwrap();
    let (status, body) = request(
        seeded_app(&temp_dir),
        "/historical_data?symbol=BTCUSDT&start_date=2024-02-01%2009:30:00&end_date=2024-02-01%2009:30:02",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_pages"], 2);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["timestamp"], "2024-02-01 09:30:02");
    assert_eq!(data[0]["price"], 12.0);
    assert_eq!(data[1]["price"], 8.0);
}

#[tokio::test]
async fn test_status_codes() {
    let temp_dir = TempDir::new().unwrap();
    let app = seeded_app(&temp_dir);

    let cases = [
        ("/current_price?symbol=BTCUSDT", StatusCode::OK),
        ("/current_price?symbol=", StatusCode::BAD_REQUEST),
        ("/current_price?symbol=ETHUSDT", StatusCode::NOT_FOUND),
        (
            "/historical_data?symbol=BTCUSDT&start_date=2024-02-01%2009:30:00&end_date=2024-02-01%2009:30:02&page=5",
            StatusCode::NOT_FOUND,
        ),
        (
            "/historical_data?symbol=BTCUSDT&start_date=2024-02-01%2009:30:02&end_date=2024-02-01%2009:30:02",
            StatusCode::BAD_REQUEST,
        ),
        (
            "/statistical_analysis?symbol=BTCUSDT&start_date=2030-01-01%2000:00:00&end_date=2030-01-02%2000:00:00",
            StatusCode::NOT_FOUND,
        ),
        ("/health", StatusCode::OK),
    ];

    for (uri, expected) in cases {
        let (status, _) = request(app.clone(), uri).await;
        assert_eq!(status, expected, "{uri}");
    }
}
