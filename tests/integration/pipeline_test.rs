//! End-to-end tests: feed transport to store to queries

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures_util::{SinkExt, StreamExt};
use price_feed::feed::{
    ConnectorPhase, ConnectorSettings, FeedConnector, FeedSession, FeedTransport, TransportError,
};
use price_feed::query::{QueryError, QueryService};
use price_feed::store::{SqliteTradeStore, TradeStore};
use price_feed::ws::WsTransport;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

/// Transport that replays a fixed list of frames once, then closes
struct ReplayTransport {
    frames: Vec<String>,
}

struct ReplaySession {
    frames: VecDeque<String>,
}

#[async_trait]
impl FeedTransport for ReplayTransport {
    async fn connect(&self) -> Result<Box<dyn FeedSession>, TransportError> {
        Ok(Box::new(ReplaySession {
            frames: self.frames.iter().cloned().collect(),
        }))
    }
}

#[async_trait]
impl FeedSession for ReplaySession {
    async fn send_text(&mut self, _text: String) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_text(&mut self) -> Result<String, TransportError> {
        self.frames
            .pop_front()
            .ok_or_else(|| TransportError::Closed("replay finished".into()))
    }
}

fn settings() -> ConnectorSettings {
    ConnectorSettings {
        symbols: vec!["BTCUSDT".to_string(), "VETUSDT".to_string()],
        message_spacing: Duration::ZERO,
        ..ConnectorSettings::default()
    }
}

fn open_store(dir: &TempDir) -> Arc<SqliteTradeStore> {
    Arc::new(SqliteTradeStore::open(dir.path().join("trades.db"), 4).unwrap())
}

#[tokio::test]
async fn test_replayed_feed_is_queryable() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    let mut frames = vec![r#"{"result":null,"id":1}"#.to_string()];
    frames.push(r#"{"e":"trade","s":"VETUSDT","p":"0.03498","q":"100"}"#.to_string());
    for _ in 0..9 {
        frames.push(r#"{"e":"trade","s":"VETUSDT","p":"0.03499","q":"100"}"#.to_string());
    }
    frames.push(r#"{"e":"trade","s":"VETUSDT","q":"100"}"#.to_string());
    frames.push(r#"{"e":"trade","s":"VETUSDT","p":"0.03493","q":"100"}"#.to_string());
    frames.push(r#"{"e":"trade","s":"BTCUSDT","p":"42000.10"}"#.to_string());

    let mut connector = FeedConnector::new(ReplayTransport { frames }, store.clone(), settings());
    let err = connector.run_session().await;

    assert!(matches!(err, TransportError::Closed(_)));
    assert_eq!(connector.phase(), ConnectorPhase::Streaming);
    assert_eq!(connector.stats().messages_received, 14);
    assert_eq!(connector.stats().trades_stored, 12);
    assert_eq!(connector.stats().malformed_messages, 1);

    let service = QueryService::new(store);

    let current = service.current_price("VETUSDT").unwrap();
    assert_eq!(current.price, dec!(0.03493));

    let stats = service.statistical_analysis("VETUSDT", None, None).unwrap();
    assert_eq!(stats.average_price, dec!(0.03));
    assert_eq!(stats.median_price, dec!(0.03499));
    assert_eq!(stats.standard_deviation, dec!(0.00));
    assert_eq!(stats.percentage_change, dec!(0.17));

    let now = Utc::now();
    let page = service
        .historical_range(
            "VETUSDT",
            now - ChronoDuration::hours(1),
            now + ChronoDuration::hours(1),
            2,
            5,
        )
        .unwrap();
    assert_eq!(page.total_items, 11);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.data.len(), 5);

    assert!(matches!(
        service.current_price("ETHUSDT"),
        Err(QueryError::SymbolNotFound)
    ));
}

#[tokio::test]
async fn test_store_survives_reopen_between_sessions() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = open_store(&temp_dir);
        let frames = vec![r#"{"s":"BTCUSDT","p":"100"}"#.to_string()];
        let mut connector = FeedConnector::new(ReplayTransport { frames }, store, settings());
        connector.run_session().await;
    }

    let store = open_store(&temp_dir);
    let frames = vec![r#"{"s":"BTCUSDT","p":"101"}"#.to_string()];
    let mut connector = FeedConnector::new(ReplayTransport { frames }, store.clone(), settings());
    connector.run_session().await;

    let trades = store.scan(0, 10).unwrap();
    assert_eq!(trades.len(), 2);
    assert!(trades[0].id < trades[1].id);
    assert_eq!(store.latest("BTCUSDT").unwrap().unwrap().price, dec!(101));
}

#[tokio::test]
async fn test_websocket_feed_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        let subscribe = ws.next().await.unwrap().unwrap();
        let request: serde_json::Value = serde_json::from_str(subscribe.to_text().unwrap()).unwrap();
        assert_eq!(request["method"], "SUBSCRIBE");
        assert_eq!(request["params"][0], "btcusdt@trade");
        assert_eq!(request["params"][1], "vetusdt@trade");
        assert_eq!(request["id"], 1);

        for frame in [
            r#"{"result":null,"id":1}"#,
            r#"{"e":"trade","s":"BTCUSDT","p":"42000.10"}"#,
            r#"{"e":"trade","s":"BTCUSDT","p":"42001.20"}"#,
        ] {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        ws.close(None).await.unwrap();
    });

    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);
    let transport = WsTransport::with_url(format!("ws://{addr}"));
    let mut connector = FeedConnector::new(transport, store.clone(), settings());

    let err = tokio::time::timeout(Duration::from_secs(10), connector.run_session())
        .await
        .unwrap();
    assert!(matches!(
        err,
        TransportError::Closed(_) | TransportError::Receive(_)
    ));
    assert_eq!(connector.stats().trades_stored, 2);

    let service = QueryService::new(store);
    assert_eq!(
        service.current_price("BTCUSDT").unwrap().price,
        dec!(42001.20)
    );

    server.await.unwrap();
}
