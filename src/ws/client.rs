//! WebSocket feed transport

use super::types::WsConfig;
use crate::feed::{FeedSession, FeedTransport, TransportError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Feed transport over tokio-tungstenite
///
/// Reconnection is not handled here; the feed connector owns the backoff.
pub struct WsTransport {
    config: WsConfig,
}

impl WsTransport {
    /// Create a new transport with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Create a new transport with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }
}

#[async_trait]
impl FeedTransport for WsTransport {
    async fn connect(&self) -> Result<Box<dyn FeedSession>, TransportError> {
        tracing::info!(url = %self.config.url, "Connecting to WebSocket");

        let (stream, _response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(self.config.url.as_str()))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;

        tracing::info!("WebSocket connected");

        Ok(Box::new(WsSession { stream }))
    }
}

/// One open WebSocket connection
pub struct WsSession {
    stream: WsStream,
}

#[async_trait]
impl FeedSession for WsSession {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn next_text(&mut self) -> Result<String, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Ping(data))) => {
                    self.stream
                        .send(Message::Pong(data))
                        .await
                        .map_err(|e| TransportError::Send(e.to_string()))?;
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "close frame".to_string());
                    tracing::info!(reason = %reason, "Received close frame");
                    return Err(TransportError::Closed(reason));
                }
                // Binance doesn't send binary messages for trade streams
                Some(Ok(Message::Binary(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
                None => return Err(TransportError::Closed("stream ended unexpectedly".into())),
            }
        }
    }
}
