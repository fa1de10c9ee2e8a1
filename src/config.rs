//! Configuration types for price-feed

use crate::telemetry::LogFormat;
use crate::ws::BINANCE_WS_URL;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// WebSocket endpoint
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// Symbols to subscribe to (each becomes a `<symbol>@trade` channel)
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Minimum spacing between processed messages, in milliseconds
    #[serde(default = "default_message_spacing_ms")]
    pub message_spacing_ms: u64,

    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// First reconnect delay
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: f64,

    /// Reconnect delay growth per consecutive failure
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Reconnect delay cap
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: f64,
}

const DEFAULT_SYMBOLS: [&str; 21] = [
    "BTCUSDT", "ETHUSDT", "XRPUSDT", "LTCUSDT", "ADABUSDT", "LINKUSDT", "BNBUSDT", "DOGEUSDT",
    "EOSUSDT", "ATOMUSDT", "SOLUSDT", "DOTUSDT", "MATICUSDT", "VETUSDT", "FTTUSDT", "XTZUSDT",
    "CHZUSDT", "THETUSDT", "BCHUSDT", "FILUSDT", "UNIETH",
];

fn default_feed_url() -> String {
    BINANCE_WS_URL.to_string()
}
fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}
fn default_message_spacing_ms() -> u64 {
    200
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_initial_backoff_secs() -> f64 {
    2.0
}
fn default_backoff_multiplier() -> f64 {
    1.5
}
fn default_max_backoff_secs() -> f64 {
    60.0
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            symbols: default_symbols(),
            message_spacing_ms: 200,
            connect_timeout_secs: 10,
            initial_backoff_secs: 2.0,
            backoff_multiplier: 1.5,
            max_backoff_secs: 60.0,
        }
    }
}

/// Trade store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("binance_cryptocurrency_prices.db")
}
fn default_pool_size() -> u32 {
    8
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            pool_size: 8,
        }
    }
}

/// HTTP query API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Page size when `per_page` is omitted
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_per_page() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_per_page: 10,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the feed connector or query layer cannot honour
    pub fn validate(&self) -> anyhow::Result<()> {
        let feed = &self.feed;

        if feed.symbols.is_empty() {
            anyhow::bail!("feed.symbols must not be empty");
        }
        let mut seen = HashSet::new();
        for symbol in &feed.symbols {
            if symbol.trim().is_empty() {
                anyhow::bail!("feed.symbols contains a blank symbol");
            }
            if !seen.insert(symbol.to_lowercase()) {
                anyhow::bail!("feed.symbols contains duplicate symbol {symbol}");
            }
        }

        if !(feed.initial_backoff_secs.is_finite() && feed.initial_backoff_secs > 0.0) {
            anyhow::bail!("feed.initial_backoff_secs must be positive");
        }
        if !(feed.backoff_multiplier.is_finite() && feed.backoff_multiplier >= 1.0) {
            anyhow::bail!("feed.backoff_multiplier must be at least 1.0");
        }
        if !feed.max_backoff_secs.is_finite() || feed.max_backoff_secs < feed.initial_backoff_secs {
            anyhow::bail!("feed.max_backoff_secs must not be below feed.initial_backoff_secs");
        }
        for (name, secs) in [
            ("feed.initial_backoff_secs", feed.initial_backoff_secs),
            ("feed.max_backoff_secs", feed.max_backoff_secs),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                anyhow::bail!("{name} = {secs} is out of range for a duration");
            }
        }
        if feed.connect_timeout_secs == 0 {
            anyhow::bail!("feed.connect_timeout_secs must be positive");
        }

        if self.store.pool_size == 0 {
            anyhow::bail!("store.pool_size must be positive");
        }
        if self.api.default_per_page == 0 {
            anyhow::bail!("api.default_per_page must be positive");
        }

        Ok(())
    }
}
