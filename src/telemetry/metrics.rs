//! Prometheus metrics
//!
//! Metric names are fixed per enum variant so dashboards can rely on them.
//! Without an installed recorder every call is a no-op.

use std::time::Duration;

/// Monotonic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMetric {
    /// Text frames received from the feed
    MessagesReceived,
    /// Trades persisted to the store
    TradesStored,
    /// Frames dropped by the normalizer
    MalformedMessages,
    /// Failed store inserts
    StoreErrors,
    /// Reconnect attempts after a session ended
    Reconnects,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Delay before the pending reconnect, zero while streaming
    BackoffSeconds,
}

/// Latency metric types, one per query operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyMetric {
    /// Latest price lookup
    CurrentPrice,
    /// Paginated history lookup
    HistoricalRange,
    /// Summary statistics
    StatisticalAnalysis,
}

impl CounterMetric {
    /// Exported metric name
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::MessagesReceived => "pricefeed_messages_received_total",
            CounterMetric::TradesStored => "pricefeed_trades_stored_total",
            CounterMetric::MalformedMessages => "pricefeed_malformed_messages_total",
            CounterMetric::StoreErrors => "pricefeed_store_errors_total",
            CounterMetric::Reconnects => "pricefeed_reconnects_total",
        }
    }
}

impl GaugeMetric {
    /// Exported metric name
    pub fn name(self) -> &'static str {
        match self {
            GaugeMetric::BackoffSeconds => "pricefeed_backoff_seconds",
        }
    }
}

impl LatencyMetric {
    /// Value of the `operation` label
    pub fn operation(self) -> &'static str {
        match self {
            LatencyMetric::CurrentPrice => "current_price",
            LatencyMetric::HistoricalRange => "historical_range",
            LatencyMetric::StatisticalAnalysis => "statistical_analysis",
        }
    }
}

/// Histogram name shared by all query operations
pub const QUERY_LATENCY_METRIC: &str = "pricefeed_query_latency_ms";

/// Increment a counter by one
pub fn increment_counter(metric: CounterMetric) {
    metrics::counter!(metric.name()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let value_ms = duration.as_secs_f64() * 1_000.0;
    metrics::histogram!(QUERY_LATENCY_METRIC, "operation" => metric.operation()).record(value_ms);

    tracing::trace!(
        operation = metric.operation(),
        value_ms = value_ms,
        "Recording latency"
    );
}
