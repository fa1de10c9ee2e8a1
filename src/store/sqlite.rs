//! SQLite-backed trade store

use super::{NewTrade, StoreError, TimeWindow, Trade, TradeStore};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    price TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS trade_symbol_index ON trades(symbol);
CREATE INDEX IF NOT EXISTS trade_timestamp_index ON trades(timestamp);
CREATE INDEX IF NOT EXISTS trade_symbol_timestamp_index ON trades(symbol, timestamp, id);
"#;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent trade store on a pooled SQLite database in WAL mode
///
/// Each insert runs in its own transaction, so a failed write rolls back
/// as a unit and readers on other pooled connections never see it.
pub struct SqliteTradeStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteTradeStore {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>, pool_size: u32) -> Result<Self, StoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let conn = pool.get()?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!(path = %path.display(), journal_mode = %mode, pool_size, "Opened trade store");

        Ok(Self { pool })
    }

    fn row_to_trade(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, i64)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    }

    fn decode(raw: (i64, String, String, i64)) -> Result<Trade, StoreError> {
        let (id, symbol, price, ts) = raw;
        let price = decode_price(id, &price)?;
        let timestamp = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| StoreError::Corrupt {
            id,
            reason: format!("timestamp out of range: {ts}"),
        })?;

        Ok(Trade {
            id,
            symbol,
            price,
            timestamp,
        })
    }
}

fn decode_price(id: i64, raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| StoreError::Corrupt {
        id,
        reason: format!("invalid price {raw:?}: {e}"),
    })
}

impl TradeStore for SqliteTradeStore {
    fn insert(&self, trade: NewTrade) -> Result<Trade, StoreError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO trades (symbol, price, timestamp) VALUES (?1, ?2, ?3)",
            params![trade.symbol, trade.price.to_string(), trade.timestamp.timestamp()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(trade.with_id(id))
    }

    fn exists_symbol(&self, symbol: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM trades WHERE symbol = ?1)",
            params![symbol],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn latest(&self, symbol: &str) -> Result<Option<Trade>, StoreError> {
        let conn = self.pool.get()?;
        let raw = conn
            .query_row(
                "SELECT id, symbol, price, timestamp FROM trades
                 WHERE symbol = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1",
                params![symbol],
                Self::row_to_trade,
            )
            .optional()?;

        raw.map(Self::decode).transpose()
    }

    fn range_exists(&self, symbol: &str, window: &TimeWindow) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM trades
                           WHERE symbol = ?1 AND timestamp >= ?2 AND timestamp <= ?3)",
            params![symbol, window.start().timestamp(), window.end().timestamp()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn count_range(&self, symbol: &str, window: &TimeWindow) -> Result<u64, StoreError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(id) FROM trades
             WHERE symbol = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
            params![symbol, window.start().timestamp(), window.end().timestamp()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn page_range(
        &self,
        symbol: &str,
        window: &TimeWindow,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Trade>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, symbol, price, timestamp FROM trades
             WHERE symbol = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp DESC, id DESC
             LIMIT ?4 OFFSET ?5",
        )?;

        let rows = stmt
            .query_map(
                params![
                    symbol,
                    window.start().timestamp(),
                    window.end().timestamp(),
                    clamp_i64(limit),
                    clamp_i64(offset)
                ],
                Self::row_to_trade,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode).collect()
    }

    fn all_prices(
        &self,
        symbol: &str,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Decimal>, StoreError> {
        let conn = self.pool.get()?;

        let rows: Vec<(i64, String)> = match window {
            Some(w) => {
                let mut stmt = conn.prepare(
                    "SELECT id, price FROM trades
                     WHERE symbol = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
                )?;
                let rows = stmt
                    .query_map(
                        params![symbol, w.start().timestamp(), w.end().timestamp()],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare("SELECT id, price FROM trades WHERE symbol = ?1")?;
                let rows = stmt
                    .query_map(params![symbol], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        rows.iter()
            .map(|(id, price)| decode_price(*id, price))
            .collect()
    }

    fn scan(&self, after_id: i64, limit: u64) -> Result<Vec<Trade>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, symbol, price, timestamp FROM trades
             WHERE id > ?1
             ORDER BY id ASC
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![after_id, clamp_i64(limit)], Self::row_to_trade)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode).collect()
    }
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
