//! In-memory trade store

use super::{NewTrade, StoreError, TimeWindow, Trade, TradeStore};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::cmp::Reverse;

/// Trade store backed by a vector behind a read/write lock
///
/// Used for tests and embedding; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    trades: Vec<Trade>,
    next_id: i64,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records
    pub fn len(&self) -> usize {
        self.inner.read().trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching<'a>(
        trades: &'a [Trade],
        symbol: &'a str,
        window: Option<&'a TimeWindow>,
    ) -> impl Iterator<Item = &'a Trade> + 'a {
        trades.iter().filter(move |t| {
            t.symbol == symbol && window.map_or(true, |w| w.contains(t.timestamp))
        })
    }
}

impl TradeStore for MemoryTradeStore {
    fn insert(&self, trade: NewTrade) -> Result<Trade, StoreError> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let stored = trade.with_id(inner.next_id);
        inner.trades.push(stored.clone());
        Ok(stored)
    }

    fn exists_symbol(&self, symbol: &str) -> Result<bool, StoreError> {
        let inner = self.inner.read();
        let found = Self::matching(&inner.trades, symbol, None).next().is_some();
        Ok(found)
    }

    fn latest(&self, symbol: &str) -> Result<Option<Trade>, StoreError> {
        let inner = self.inner.read();
        Ok(Self::matching(&inner.trades, symbol, None)
            .max_by_key(|t| (t.timestamp, t.id))
            .cloned())
    }

    fn range_exists(&self, symbol: &str, window: &TimeWindow) -> Result<bool, StoreError> {
        let inner = self.inner.read();
        let found = Self::matching(&inner.trades, symbol, Some(window))
            .next()
            .is_some();
        Ok(found)
    }

    fn count_range(&self, symbol: &str, window: &TimeWindow) -> Result<u64, StoreError> {
        let inner = self.inner.read();
        Ok(Self::matching(&inner.trades, symbol, Some(window)).count() as u64)
    }

    fn page_range(
        &self,
        symbol: &str,
        window: &TimeWindow,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Trade>, StoreError> {
        let inner = self.inner.read();
        let mut rows: Vec<Trade> = Self::matching(&inner.trades, symbol, Some(window))
            .cloned()
            .collect();
        rows.sort_by_key(|t| Reverse((t.timestamp, t.id)));

        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    fn all_prices(
        &self,
        symbol: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Decimal>, StoreError> {
        let inner = self.inner.read();
        Ok(Self::matching(&inner.trades, symbol, window)
            .map(|t| t.price)
            .collect())
    }

    fn scan(&self, after_id: i64, limit: u64) -> Result<Vec<Trade>, StoreError> {
        let inner = self.inner.read();
        // ids are assigned in push order
        Ok(inner
            .trades
            .iter()
            .filter(|t| t.id > after_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
