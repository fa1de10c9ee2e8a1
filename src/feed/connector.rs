//! Feed connector state machine
//!
//! `Idle → Connecting → Subscribing → Streaming`; any transport failure moves
//! to `Backoff`, which sleeps and goes back to `Connecting`. The connector has
//! no terminal state and never stops on its own.

use super::normalizer;
use super::types::SubscribeAck;
use super::{
    Backoff, ConnectorPhase, ConnectorStats, FeedTransport, IngestError, SubscribeRequest,
    TransportError, SUBSCRIBE_REQUEST_ID,
};
use crate::config::FeedConfig;
use crate::store::{Trade, TradeStore};
use crate::telemetry::{increment_counter, set_gauge, CounterMetric, GaugeMetric};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Connector tuning
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    /// Symbols whose `@trade` channels are subscribed
    pub symbols: Vec<String>,
    /// Minimum spacing between processed messages (zero disables)
    pub message_spacing: Duration,
    /// First reconnect delay
    pub initial_backoff: Duration,
    /// Growth factor per consecutive failure
    pub backoff_multiplier: f64,
    /// Reconnect delay cap
    pub max_backoff: Duration,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            message_spacing: Duration::from_millis(200),
            initial_backoff: Duration::from_secs(2),
            backoff_multiplier: 1.5,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl From<&FeedConfig> for ConnectorSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            symbols: config.symbols.clone(),
            message_spacing: Duration::from_millis(config.message_spacing_ms),
            initial_backoff: saturating_secs(config.initial_backoff_secs),
            backoff_multiplier: config.backoff_multiplier,
            max_backoff: saturating_secs(config.max_backoff_secs),
        }
    }
}

/// Seconds to a duration, clamped to `[ZERO, MAX]`; NaN maps to zero
fn saturating_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Drives one feed transport and writes normalized trades to the store
pub struct FeedConnector<T> {
    transport: T,
    store: Arc<dyn TradeStore>,
    subscribe: SubscribeRequest,
    spacing: Duration,
    backoff: Backoff,
    phase: ConnectorPhase,
    stats: ConnectorStats,
}

impl<T: FeedTransport> FeedConnector<T> {
    pub fn new(transport: T, store: Arc<dyn TradeStore>, settings: ConnectorSettings) -> Self {
        Self {
            transport,
            store,
            subscribe: SubscribeRequest::for_symbols(&settings.symbols),
            spacing: settings.message_spacing,
            backoff: Backoff::new(
                settings.initial_backoff,
                settings.backoff_multiplier,
                settings.max_backoff,
            ),
            phase: ConnectorPhase::Idle,
            stats: ConnectorStats::default(),
        }
    }

    pub fn phase(&self) -> ConnectorPhase {
        self.phase
    }

    /// Delay the next backoff will wait
    pub fn retry_delay(&self) -> Duration {
        self.backoff.current()
    }

    pub fn stats(&self) -> &ConnectorStats {
        &self.stats
    }

    /// Run forever: stream, back off on failure, reconnect
    pub async fn run(mut self) {
        tracing::info!(
            channels = self.subscribe.params.len(),
            "Starting feed connector"
        );

        loop {
            let error = self.run_session().await;
            tracing::error!(
                error = %error,
                delay_secs = self.backoff.current().as_secs_f64(),
                "Feed connection lost, retrying"
            );
            self.backoff().await;
        }
    }

    /// One pass through Connecting, Subscribing and Streaming
    ///
    /// Returns the transport failure that ended the session. Per-message
    /// failures are logged and never end it.
    pub async fn run_session(&mut self) -> TransportError {
        self.set_phase(ConnectorPhase::Connecting);
        let mut session = match self.transport.connect().await {
            Ok(session) => session,
            Err(e) => return e,
        };

        self.set_phase(ConnectorPhase::Subscribing);
        let request = match serde_json::to_string(&self.subscribe) {
            Ok(request) => request,
            Err(e) => return TransportError::Send(e.to_string()),
        };
        if let Err(e) = session.send_text(request).await {
            return e;
        }

        self.set_phase(ConnectorPhase::Streaming);
        self.backoff.reset();
        set_gauge(GaugeMetric::BackoffSeconds, 0.0);
        tracing::info!(
            channels = self.subscribe.params.len(),
            "Subscribed to trade streams"
        );

        loop {
            let raw = match session.next_text().await {
                Ok(raw) => raw,
                Err(e) => return e,
            };
            self.stats.messages_received += 1;
            increment_counter(CounterMetric::MessagesReceived);

            if !self.spacing.is_zero() {
                sleep(self.spacing).await;
            }

            match self.process_message(&raw).await {
                Ok(Some(trade)) => {
                    tracing::debug!(
                        id = trade.id,
                        symbol = %trade.symbol,
                        price = %trade.price,
                        "Trade stored"
                    );
                }
                Ok(None) => {}
                Err(IngestError::Malformed(e)) => {
                    tracing::warn!(error = %e, "Dropping malformed feed message");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to store trade");
                }
            }
        }
    }

    /// Wait out the current backoff delay and grow it
    pub async fn backoff(&mut self) -> Duration {
        self.set_phase(ConnectorPhase::Backoff);
        let delay = self.backoff.next_delay();
        self.stats.reconnects += 1;
        increment_counter(CounterMetric::Reconnects);
        set_gauge(GaugeMetric::BackoffSeconds, delay.as_secs_f64());

        sleep(delay).await;
        delay
    }

    /// Normalize and persist one raw message
    ///
    /// Returns `Ok(None)` for subscription acknowledgements.
    pub async fn process_message(&mut self, raw: &str) -> Result<Option<Trade>, IngestError> {
        if let Ok(ack) = serde_json::from_str::<SubscribeAck>(raw) {
            if ack.id == SUBSCRIBE_REQUEST_ID {
                tracing::debug!("Subscription acknowledged");
                return Ok(None);
            }
        }

        let trade = match normalizer::normalize(raw) {
            Ok(trade) => trade,
            Err(e) => {
                self.stats.malformed_messages += 1;
                increment_counter(CounterMetric::MalformedMessages);
                return Err(e.into());
            }
        };

        let store = self.store.clone();
        let result = match tokio::task::spawn_blocking(move || store.insert(trade)).await {
            Ok(Ok(trade)) => Ok(trade),
            Ok(Err(e)) => Err(IngestError::Store(e)),
            Err(e) => Err(IngestError::Worker(e.to_string())),
        };

        match result {
            Ok(trade) => {
                self.stats.trades_stored += 1;
                increment_counter(CounterMetric::TradesStored);
                Ok(Some(trade))
            }
            Err(e) => {
                self.stats.store_failures += 1;
                increment_counter(CounterMetric::StoreErrors);
                Err(e)
            }
        }
    }

    fn set_phase(&mut self, phase: ConnectorPhase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "Connector phase change");
            self.phase = phase;
        }
    }
}
