//! Query result and error types

use crate::store::{StoreError, Trade};
use crate::time_format;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Latest known price for a symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// One row of a historical page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(serialize_with = "time_format::serialize")]
    pub timestamp: DateTime<Utc>,
}

impl From<Trade> for PricePoint {
    fn from(trade: Trade) -> Self {
        Self {
            symbol: trade.symbol,
            price: trade.price,
            timestamp: trade.timestamp,
        }
    }
}

/// A page of trades inside a time window, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPage {
    pub total_items: u64,
    pub total_pages: u64,
    pub data: Vec<PricePoint>,
}

/// Summary statistics over a symbol's prices
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStatistics {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub median_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub standard_deviation: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_change: Decimal,
}

/// Coarse classification of a query failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied invalid arguments
    Validation,
    /// Nothing matched; not a fault
    NotFound,
    /// Store or computation failure
    Failure,
}

/// Statistics computation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("no prices to summarize")]
    EmptySeries,
    #[error("percentage change is undefined for a zero base price")]
    ZeroBasePrice,
    #[error("arithmetic overflow while summarizing prices")]
    Overflow,
}

/// Query service errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Symbol does not exist in the database")]
    SymbolNotFound,

    #[error("Data not found for the specified symbol")]
    NoData,

    #[error("Start date must be earlier than the end date")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("page and per_page must be positive integers")]
    InvalidPage,

    #[error("Data not found for the specified date range")]
    NoDataInRange,

    #[error("Requested page is out of range. Please provide a valid page number")]
    PageOutOfRange { total_items: u64, total_pages: u64 },

    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    #[error("Statistics computation failed: {0}")]
    Computation(#[from] StatsError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidRange { .. } | QueryError::InvalidPage => ErrorKind::Validation,
            QueryError::SymbolNotFound
            | QueryError::NoData
            | QueryError::NoDataInRange
            | QueryError::PageOutOfRange { .. } => ErrorKind::NotFound,
            QueryError::Store(_) | QueryError::Computation(_) => ErrorKind::Failure,
        }
    }
}
