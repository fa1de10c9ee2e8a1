//! Query service over a shared trade store

use super::stats::summarize;
use super::types::{CurrentPrice, HistoricalPage, PricePoint, PriceStatistics, QueryError};
use crate::store::{TimeWindow, TradeStore};
use crate::telemetry::{record_latency, LatencyMetric};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Read-only operations over persisted trades
///
/// Stateless apart from the store handle, so clones can serve requests in
/// parallel. Argument validation always happens before the store is
/// touched.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn TradeStore>,
}

impl QueryService {
    /// Create a new query service
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self { store }
    }

    /// Latest stored price for `symbol`
    pub fn current_price(&self, symbol: &str) -> Result<CurrentPrice, QueryError> {
        let started = Instant::now();
        let result = self.current_price_inner(symbol);
        record_latency(LatencyMetric::CurrentPrice, started.elapsed());
        result
    }

    fn current_price_inner(&self, symbol: &str) -> Result<CurrentPrice, QueryError> {
        self.ensure_symbol(symbol)?;

        let trade = self.store.latest(symbol)?.ok_or(QueryError::NoData)?;
        Ok(CurrentPrice {
            symbol: trade.symbol,
            price: trade.price,
        })
    }

    /// One page of trades for `symbol` within `[start, end]`, newest first
    ///
    /// `page` is 1-based.
    pub fn historical_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        per_page: u64,
    ) -> Result<HistoricalPage, QueryError> {
        let started = Instant::now();
        let result = self.historical_range_inner(symbol, start, end, page, per_page);
        record_latency(LatencyMetric::HistoricalRange, started.elapsed());
        result
    }

    fn historical_range_inner(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: u64,
        per_page: u64,
    ) -> Result<HistoricalPage, QueryError> {
        let window = TimeWindow::new(start, end).ok_or(QueryError::InvalidRange { start, end })?;
        if page == 0 || per_page == 0 {
            return Err(QueryError::InvalidPage);
        }

        self.ensure_symbol(symbol)?;
        if !self.store.range_exists(symbol, &window)? {
            return Err(QueryError::NoDataInRange);
        }

        let total_items = self.store.count_range(symbol, &window)?;
        let total_pages = total_items.div_ceil(per_page);
        let offset = (page - 1).saturating_mul(per_page);

        let trades = self.store.page_range(symbol, &window, offset, per_page)?;
        if trades.is_empty() && page > 1 && total_items > 0 {
            return Err(QueryError::PageOutOfRange {
                total_items,
                total_pages,
            });
        }

        Ok(HistoricalPage {
            total_items,
            total_pages,
            data: trades.into_iter().map(PricePoint::from).collect(),
        })
    }

    /// Summary statistics for `symbol`
    ///
    /// The window applies only when both bounds are given; a single bound
    /// is ignored.
    pub fn statistical_analysis(
        &self,
        symbol: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceStatistics, QueryError> {
        let started = Instant::now();
        let result = self.statistical_analysis_inner(symbol, start, end);
        record_latency(LatencyMetric::StatisticalAnalysis, started.elapsed());
        result
    }

    fn statistical_analysis_inner(
        &self,
        symbol: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<PriceStatistics, QueryError> {
        let window = match (start, end) {
            (Some(start), Some(end)) => Some(
                TimeWindow::new(start, end).ok_or(QueryError::InvalidRange { start, end })?,
            ),
            _ => None,
        };

        self.ensure_symbol(symbol)?;
        if let Some(window) = &window {
            if !self.store.range_exists(symbol, window)? {
                return Err(QueryError::NoDataInRange);
            }
        }

        let prices = self.store.all_prices(symbol, window.as_ref())?;
        let summary = summarize(prices)?;

        Ok(PriceStatistics {
            symbol: symbol.to_string(),
            average_price: summary.average,
            median_price: summary.median,
            standard_deviation: summary.standard_deviation,
            percentage_change: summary.percentage_change,
        })
    }

    fn ensure_symbol(&self, symbol: &str) -> Result<(), QueryError> {
        if self.store.exists_symbol(symbol)? {
            Ok(())
        } else {
            Err(QueryError::SymbolNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ErrorKind;
    use crate::store::{MemoryTradeStore, NewTrade, StoreError, Trade};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn seeded(trades: &[(&str, Decimal, i64)]) -> Arc<MemoryTradeStore> {
        let store = Arc::new(MemoryTradeStore::new());
        for (symbol, price, secs) in trades {
            store
                .insert(NewTrade {
                    symbol: symbol.to_string(),
                    price: *price,
                    timestamp: at(*secs),
                })
                .unwrap();
        }
        store
    }

    /// Wraps a store and counts every call that reaches it
    struct CountingStore {
        inner: MemoryTradeStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn touch(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl TradeStore for CountingStore {
        fn insert(&self, trade: NewTrade) -> Result<Trade, StoreError> {
            self.touch();
            self.inner.insert(trade)
        }
        fn exists_symbol(&self, symbol: &str) -> Result<bool, StoreError> {
            self.touch();
            self.inner.exists_symbol(symbol)
        }
        fn latest(&self, symbol: &str) -> Result<Option<Trade>, StoreError> {
            self.touch();
            self.inner.latest(symbol)
        }
        fn range_exists(&self, symbol: &str, window: &TimeWindow) -> Result<bool, StoreError> {
            self.touch();
            self.inner.range_exists(symbol, window)
        }
        fn count_range(&self, symbol: &str, window: &TimeWindow) -> Result<u64, StoreError> {
            self.touch();
            self.inner.count_range(symbol, window)
        }
        fn page_range(
            &self,
            symbol: &str,
            window: &TimeWindow,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<Trade>, StoreError> {
            self.touch();
            self.inner.page_range(symbol, window, offset, limit)
        }
        fn all_prices(
            &self,
            symbol: &str,
            window: Option<&TimeWindow>,
        ) -> Result<Vec<Decimal>, StoreError> {
            self.touch();
            self.inner.all_prices(symbol, window)
        }
        fn scan(&self, after_id: i64, limit: u64) -> Result<Vec<Trade>, StoreError> {
            self.touch();
            self.inner.scan(after_id, limit)
        }
    }

    /// Store whose reads always fail
    struct FailingStore;

    impl TradeStore for FailingStore {
        fn insert(&self, _trade: NewTrade) -> Result<Trade, StoreError> {
            Err(corrupt())
        }
        fn exists_symbol(&self, _symbol: &str) -> Result<bool, StoreError> {
            Err(corrupt())
        }
        fn latest(&self, _symbol: &str) -> Result<Option<Trade>, StoreError> {
            Err(corrupt())
        }
        fn range_exists(&self, _: &str, _: &TimeWindow) -> Result<bool, StoreError> {
            Err(corrupt())
        }
        fn count_range(&self, _: &str, _: &TimeWindow) -> Result<u64, StoreError> {
            Err(corrupt())
        }
        fn page_range(&self, _: &str, _: &TimeWindow, _: u64, _: u64) -> Result<Vec<Trade>, StoreError> {
            Err(corrupt())
        }
        fn all_prices(&self, _: &str, _: Option<&TimeWindow>) -> Result<Vec<Decimal>, StoreError> {
            Err(corrupt())
        }
        fn scan(&self, _: i64, _: u64) -> Result<Vec<Trade>, StoreError> {
            Err(corrupt())
        }
    }

    fn corrupt() -> StoreError {
        StoreError::Corrupt {
            id: 0,
            reason: "disk on fire".to_string(),
        }
    }

    #[test]
    fn test_unknown_symbol_not_found_everywhere() {
        let service = QueryService::new(seeded(&[("BTCUSDT", dec!(1), 0)]));

        assert!(matches!(
            service.current_price("ETHUSDT"),
            Err(QueryError::SymbolNotFound)
        ));
        assert!(matches!(
            service.historical_range("ETHUSDT", at(0), at(10), 1, 10),
            Err(QueryError::SymbolNotFound)
        ));
        assert!(matches!(
            service.statistical_analysis("ETHUSDT", None, None),
            Err(QueryError::SymbolNotFound)
        ));
    }

    #[test]
    fn test_current_price_is_latest() {
        let service = QueryService::new(seeded(&[
            ("BTCUSDT", dec!(100), 0),
            ("BTCUSDT", dec!(101), 5),
            ("BTCUSDT", dec!(102), 5),
            ("ETHUSDT", dec!(7), 9),
        ]));

        let current = service.current_price("BTCUSDT").unwrap();
        assert_eq!(current.symbol, "BTCUSDT");
        assert_eq!(current.price, dec!(102));
    }

    #[test]
    fn test_invalid_range_never_touches_store() {
        let store = Arc::new(CountingStore {
            inner: MemoryTradeStore::new(),
            calls: AtomicUsize::new(0),
        });
        let service = QueryService::new(store.clone());

        let err = service
            .historical_range("BTCUSDT", at(10), at(10), 1, 10)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidRange { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .statistical_analysis("BTCUSDT", Some(at(20)), Some(at(10)))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidRange { .. }));

        let err = service
            .historical_range("BTCUSDT", at(0), at(10), 0, 10)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidPage));

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_historical_pagination() {
        let trades: Vec<_> = (0..25).map(|i| ("BTCUSDT", Decimal::from(i), i)).collect();
        let service = QueryService::new(seeded(&trades));

        let first = service
            .historical_range("BTCUSDT", at(0), at(100), 1, 10)
            .unwrap();
        assert_eq!(first.total_items, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.data[0].price, dec!(24));
        assert_eq!(first.data[0].timestamp, at(24));

        let last = service
            .historical_range("BTCUSDT", at(0), at(100), 3, 10)
            .unwrap();
        assert_eq!(last.data.len(), 5);
        assert_eq!(last.data[4].price, dec!(0));
    }

    #[test]
    fn test_historical_window_is_inclusive() {
        let trades: Vec<_> = (0..10).map(|i| ("BTCUSDT", Decimal::from(i), i)).collect();
        let service = QueryService::new(seeded(&trades));

        let page = service
            .historical_range("BTCUSDT", at(2), at(5), 1, 10)
            .unwrap();
        assert_eq!(page.total_items, 4);
        let prices: Vec<_> = page.data.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![dec!(5), dec!(4), dec!(3), dec!(2)]);
    }

    #[test]
    fn test_page_out_of_range() {
        let trades: Vec<_> = (0..25).map(|i| ("BTCUSDT", Decimal::from(i), i)).collect();
        let service = QueryService::new(seeded(&trades));

        let err = service
            .historical_range("BTCUSDT", at(0), at(100), 4, 10)
            .unwrap_err();
        match err {
            QueryError::PageOutOfRange {
                total_items,
                total_pages,
            } => {
                assert_eq!(total_items, 25);
                assert_eq!(total_pages, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_data_in_range() {
        let service = QueryService::new(seeded(&[("BTCUSDT", dec!(1), 0)]));

        assert!(matches!(
            service.historical_range("BTCUSDT", at(100), at(200), 1, 10),
            Err(QueryError::NoDataInRange)
        ));
        assert!(matches!(
            service.statistical_analysis("BTCUSDT", Some(at(100)), Some(at(200))),
            Err(QueryError::NoDataInRange)
        ));
    }

    #[test]
    fn test_historical_range_is_idempotent() {
        let trades: Vec<_> = (0..12).map(|i| ("BTCUSDT", Decimal::from(i), i / 3)).collect();
        let service = QueryService::new(seeded(&trades));

        let a = service
            .historical_range("BTCUSDT", at(0), at(10), 2, 5)
            .unwrap();
        let b = service
            .historical_range("BTCUSDT", at(0), at(10), 2, 5)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        let trades: Vec<_> = (0..7).map(|i| ("BTCUSDT", Decimal::from(i), i)).collect();
        let service = QueryService::new(seeded(&trades));

        for (per_page, expected) in [(1, 7), (2, 4), (3, 3), (7, 1), (50, 1)] {
            let page = service
                .historical_range("BTCUSDT", at(0), at(10), 1, per_page)
                .unwrap();
            assert_eq!(page.total_pages, expected, "per_page = {per_page}");
        }
    }

    #[test]
    fn test_statistics_windowed_and_unwindowed() {
        let service = QueryService::new(seeded(&[
            ("BTCUSDT", dec!(10), 0),
            ("BTCUSDT", dec!(8), 1),
            ("BTCUSDT", dec!(12), 2),
            ("BTCUSDT", dec!(100), 50),
        ]));

        let windowed = service
            .statistical_analysis("BTCUSDT", Some(at(0)), Some(at(2)))
            .unwrap();
        assert_eq!(windowed.symbol, "BTCUSDT");
        assert_eq!(windowed.average_price, dec!(10.00));
        assert_eq!(windowed.median_price, dec!(10));
        assert_eq!(windowed.percentage_change, dec!(50.00));

        let all = service.statistical_analysis("BTCUSDT", None, None).unwrap();
        assert_eq!(all.average_price, dec!(32.50));
    }

    #[test]
    fn test_single_bound_is_ignored() {
        let service = QueryService::new(seeded(&[
            ("BTCUSDT", dec!(1), 0),
            ("BTCUSDT", dec!(3), 100),
        ]));

        let stats = service
            .statistical_analysis("BTCUSDT", Some(at(50)), None)
            .unwrap();
        assert_eq!(stats.average_price, dec!(2.00));
    }

    #[test]
    fn test_zero_base_price_is_failure() {
        let service = QueryService::new(seeded(&[
            ("BTCUSDT", dec!(0), 0),
            ("BTCUSDT", dec!(3), 1),
        ]));

        let err = service
            .statistical_analysis("BTCUSDT", None, None)
            .unwrap_err();
        assert!(matches!(err, QueryError::Computation(_)));
        assert_eq!(err.kind(), ErrorKind::Failure);
    }

    #[test]
    fn test_store_failure_is_distinct_from_not_found() {
        let service = QueryService::new(Arc::new(FailingStore));

        let err = service.current_price("BTCUSDT").unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
        assert_eq!(err.kind(), ErrorKind::Failure);
    }
}
