//! WebSocket types and configuration

use crate::config::FeedConfig;
use std::time::Duration;

/// Binance WebSocket base URL
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// WebSocket transport configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Upper bound on establishing a connection
    pub connect_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: BINANCE_WS_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, d: Duration) -> Self {
        self.connect_timeout = d;
        self
    }
}

impl From<&FeedConfig> for WsConfig {
    fn from(config: &FeedConfig) -> Self {
        Self::new(config.url.clone())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
    }
}
