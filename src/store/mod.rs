//! Trade store module
//!
//! Append-only, ordered persistence for normalized trades. The feed
//! connector is the single writer; query workers read concurrently.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryTradeStore;
pub use sqlite::SqliteTradeStore;
pub use types::{NewTrade, StoreError, TimeWindow, Trade};

use rust_decimal::Decimal;

/// Trait for trade store implementations
///
/// Records are totally ordered by `(timestamp, id)`. Every insert is
/// atomic: readers never observe a partially written record.
pub trait TradeStore: Send + Sync {
    /// Persist one trade and return it with its assigned id
    fn insert(&self, trade: NewTrade) -> Result<Trade, StoreError>;

    /// True iff at least one record exists for `symbol`
    fn exists_symbol(&self, symbol: &str) -> Result<bool, StoreError>;

    /// Record with the greatest `(timestamp, id)` for `symbol`
    fn latest(&self, symbol: &str) -> Result<Option<Trade>, StoreError>;

    /// True iff at least one record for `symbol` falls inside `window`
    fn range_exists(&self, symbol: &str, window: &TimeWindow) -> Result<bool, StoreError>;

    /// Number of records for `symbol` inside `window`
    fn count_range(&self, symbol: &str, window: &TimeWindow) -> Result<u64, StoreError>;

    /// Records for `symbol` inside `window`, newest first, windowed by offset/limit
    fn page_range(
        &self,
        symbol: &str,
        window: &TimeWindow,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Trade>, StoreError>;

    /// All prices for `symbol`, optionally restricted to `window`. Order is unspecified.
    fn all_prices(
        &self,
        symbol: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Decimal>, StoreError>;

    /// Up to `limit` records with `id > after_id`, ascending by id
    fn scan(&self, after_id: i64, limit: u64) -> Result<Vec<Trade>, StoreError>;
}
