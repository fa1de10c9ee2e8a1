//! Trade record types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// A persisted trade record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    /// Monotonic identifier assigned by the store
    pub id: i64,
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Trade price
    pub price: Decimal,
    /// Ingestion time, whole seconds
    pub timestamp: DateTime<Utc>,
}

/// A normalized trade that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl NewTrade {
    /// Attach the store-assigned id
    pub fn with_id(self, id: i64) -> Trade {
        Trade {
            id,
            symbol: self.symbol,
            price: self.price,
            timestamp: self.timestamp,
        }
    }
}

/// Inclusive time window `[start, end]` with `start < end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` unless `start < end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `ts` falls inside the window, bounds included
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Trade store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection pool failure
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Stored row could not be decoded
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
    /// Filesystem failure while opening the store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
