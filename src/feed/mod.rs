//! Price feed module
//!
//! Ingestion pipeline: a [`FeedConnector`] owns the connection lifecycle to
//! the Binance trade stream, hands each message to the normalizer and writes
//! the result to the trade store.

mod backoff;
mod connector;
pub mod normalizer;
mod types;

pub use backoff::Backoff;
pub use connector::{ConnectorSettings, FeedConnector};
pub use types::{
    ConnectorPhase, ConnectorStats, IngestError, MalformedMessage, SubscribeRequest,
    TransportError, SUBSCRIBE_REQUEST_ID,
};

use async_trait::async_trait;

/// Trait for feed transports: something that can open a message session
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Establish a new connection
    async fn connect(&self) -> Result<Box<dyn FeedSession>, TransportError>;
}

/// One open connection to the feed
#[async_trait]
pub trait FeedSession: Send {
    /// Send a text frame
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next text frame
    ///
    /// A closed or broken connection is reported as an error; a session
    /// never ends cleanly.
    async fn next_text(&mut self) -> Result<String, TransportError>;
}
