//! Price feed types

use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Subscription request id sent with every SUBSCRIBE
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Connector lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorPhase {
    Idle,
    Connecting,
    Subscribing,
    Streaming,
    Backoff,
}

/// Binance SUBSCRIBE request
#[derive(Debug, Clone, Serialize)]
pub struct SubscribeRequest {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeRequest {
    /// Build a request for the `<symbol>@trade` channel of every symbol
    ///
    /// Symbols are matched case-insensitively; repeats keep the first position.
    pub fn for_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        let mut seen = HashSet::new();
        Self {
            method: "SUBSCRIBE",
            params: symbols
                .iter()
                .map(|s| s.as_ref().to_lowercase())
                .filter(|s| seen.insert(s.clone()))
                .map(|s| format!("{s}@trade"))
                .collect(),
            id: SUBSCRIBE_REQUEST_ID,
        }
    }
}

/// Reply to a SUBSCRIBE request, e.g. `{"result":null,"id":1}`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SubscribeAck {
    #[allow(dead_code)]
    pub result: Option<serde_json::Value>,
    pub id: u64,
}

/// Transport-level feed failures; always answered with backoff and reconnect
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Could not establish the connection
    #[error("Connection failed: {0}")]
    ConnectFailed(String),
    /// Connection attempt exceeded the connect timeout
    #[error("Connection timed out")]
    Timeout,
    /// Peer closed the connection or the stream ended
    #[error("Connection closed: {0}")]
    Closed(String),
    /// Reading from the connection failed
    #[error("Receive failed: {0}")]
    Receive(String),
    /// Writing to the connection failed
    #[error("Send failed: {0}")]
    Send(String),
}

/// Raw feed message rejected by the normalizer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedMessage {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Message is not a JSON object")]
    NotAnObject,
    #[error("Missing field `{0}`")]
    MissingField(&'static str),
    #[error("Field `{field}` has wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Symbol is empty")]
    EmptySymbol,
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

/// Failure while processing a single feed message; never ends the stream
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] MalformedMessage),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    /// The blocking insert task panicked or was cancelled
    #[error("Insert task failed: {0}")]
    Worker(String),
}

/// Connector counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectorStats {
    pub messages_received: u64,
    pub trades_stored: u64,
    pub malformed_messages: u64,
    pub store_failures: u64,
    pub reconnects: u64,
}
