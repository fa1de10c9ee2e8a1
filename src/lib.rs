//! price-feed: Binance trade ingestion with a price query service
//!
//! This library provides the core components for:
//! - Streaming trades from the Binance WebSocket feed with reconnect backoff
//! - Normalizing trade messages into stored records
//! - Persisting trades to SQLite (or memory for tests)
//! - Current price, paginated history and summary statistics queries
//! - An HTTP query API
//! - Parquet export of stored trades
//! - Structured logging and Prometheus metrics

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod feed;
pub mod query;
pub mod store;
pub mod telemetry;
pub mod time_format;
pub mod ws;
