//! Query module
//!
//! Current price, paginated history and summary statistics over the
//! trade store.

mod service;
mod stats;
mod types;

pub use service::QueryService;
pub use stats::{summarize, PriceSummary};
pub use types::{
    CurrentPrice, ErrorKind, HistoricalPage, PricePoint, PriceStatistics, QueryError, StatsError,
};
