//! WebSocket transport
//!
//! Implements the feed transport traits over tokio-tungstenite, with
//! ping/pong handling and a bounded connect.

mod client;
mod types;

pub use client::{WsSession, WsTransport};
pub use types::{WsConfig, BINANCE_WS_URL};
