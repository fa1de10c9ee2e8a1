//! Parquet export of stored trades

use crate::store::{Trade, TradeStore};
use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Trade schema fields
pub fn trade_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("price", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
    ])
}

/// Outcome of one export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: u64,
    pub batches: u64,
}

/// Streams the trade store into a single Snappy-compressed Parquet file
pub struct ParquetExporter {
    output_dir: PathBuf,
    batch_size: u64,
    symbol: Option<String>,
}

impl ParquetExporter {
    /// Create a new exporter writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, batch_size: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            batch_size: batch_size.max(1),
            symbol: None,
        }
    }

    /// Only export trades for `symbol`
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Generate the output path for an export started at `timestamp`
    pub fn file_path(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let prefix = match &self.symbol {
            Some(symbol) => format!("trades_{}", symbol.to_lowercase()),
            None => "trades".to_string(),
        };
        let filename = format!("{}_{}.parquet", prefix, timestamp.format("%Y%m%d_%H%M%S"));
        self.output_dir.join(filename)
    }

    /// Export every stored trade (after the symbol filter) to `path`
    ///
    /// The store is read in id order, one record batch per scan.
    pub fn export(&self, store: &dyn TradeStore, path: &Path) -> anyhow::Result<ExportSummary> {
        fs::create_dir_all(&self.output_dir)?;

        let schema: SchemaRef = Arc::new(trade_schema());
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let mut after_id = 0;
        let mut rows = 0u64;
        let mut batches = 0u64;

        loop {
            let scanned = store.scan(after_id, self.batch_size)?;
            let Some(last) = scanned.last() else {
                break;
            };
            after_id = last.id;
            let exhausted = (scanned.len() as u64) < self.batch_size;

            let trades: Vec<&Trade> = scanned
                .iter()
                .filter(|t| self.symbol.as_deref().map_or(true, |s| t.symbol == s))
                .collect();

            if !trades.is_empty() {
                writer.write(&trade_batch(schema.clone(), &trades)?)?;
                rows += trades.len() as u64;
                batches += 1;
            }

            if exhausted {
                break;
            }
        }

        writer.close()?;

        tracing::info!(path = ?path, rows, batches, "Exported trades to Parquet");

        Ok(ExportSummary {
            path: path.to_path_buf(),
            rows,
            batches,
        })
    }
}

fn trade_batch(schema: SchemaRef, trades: &[&Trade]) -> anyhow::Result<RecordBatch> {
    let ids: Vec<i64> = trades.iter().map(|t| t.id).collect();
    let symbols: Vec<&str> = trades.iter().map(|t| t.symbol.as_str()).collect();
    let prices: Vec<String> = trades.iter().map(|t| t.price.to_string()).collect();
    let timestamps: Vec<i64> = trades
        .iter()
        .map(|t| t.timestamp.timestamp_micros())
        .collect();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)) as ArrayRef,
            Arc::new(StringArray::from(symbols)) as ArrayRef,
            Arc::new(StringArray::from(
                prices.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )) as ArrayRef,
            Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                as ArrayRef,
        ],
    )?;

    Ok(batch)
}

/// Reader for exported trade files
pub struct TradeReader {
    path: PathBuf,
}

impl TradeReader {
    /// Create a new reader for a Parquet file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read all trades back from the file
    pub fn read_trades(&self) -> anyhow::Result<Vec<Trade>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut trades = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let ids = batch
                .column(0)
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| anyhow::anyhow!("Invalid id column"))?;

            let symbols = batch
                .column(1)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow::anyhow!("Invalid symbol column"))?;

            let prices = batch
                .column(2)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow::anyhow!("Invalid price column"))?;

            let timestamps = batch
                .column(3)
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column"))?;

            for i in 0..batch.num_rows() {
                let timestamp = DateTime::from_timestamp_micros(timestamps.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?;

                trades.push(Trade {
                    id: ids.value(i),
                    symbol: symbols.value(i).to_string(),
                    price: Decimal::from_str(prices.value(i))?,
                    timestamp,
                });
            }
        }

        Ok(trades)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryTradeStore, NewTrade};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn seeded_store() -> MemoryTradeStore {
        let store = MemoryTradeStore::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for i in 0..7 {
            let symbol = if i % 2 == 0 { "BTCUSDT" } else { "ETHUSDT" };
            store
                .insert(NewTrade {
                    symbol: symbol.to_string(),
                    price: dec!(100.125) + Decimal::from(i),
                    timestamp: base + chrono::Duration::seconds(i),
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_trade_schema() {
        let schema = trade_schema();
        assert_eq!(schema.fields().len(), 4);
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(1).name(), "symbol");
        assert_eq!(schema.field(2).name(), "price");
        assert_eq!(schema.field(3).name(), "timestamp");
    }

    #[test]
    fn test_file_path() {
        let exporter = ParquetExporter::new("/data", 100).with_symbol("BTCUSDT");
        let timestamp = Utc.with_ymd_and_hms(2025, 1, 4, 12, 30, 0).unwrap();

        assert_eq!(
            exporter.file_path(timestamp),
            PathBuf::from("/data/trades_btcusdt_20250104_123000.parquet")
        );
    }

    #[test]
    fn test_export_in_batches() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_store();
        let exporter = ParquetExporter::new(temp_dir.path(), 3);

        let path = exporter.file_path(Utc::now());
        let summary = exporter.export(&store, &path).unwrap();
        assert_eq!(summary.rows, 7);
        assert_eq!(summary.batches, 3);

        let trades = TradeReader::new(&path).read_trades().unwrap();
        assert_eq!(trades.len(), 7);
        assert_eq!(trades, store.scan(0, 100).unwrap());
        assert_eq!(trades[0].price, dec!(100.125));
    }

    #[test]
    fn test_export_symbol_filter() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_store();
        let exporter = ParquetExporter::new(temp_dir.path(), 2).with_symbol("ETHUSDT");

        let path = exporter.file_path(Utc::now());
        let summary = exporter.export(&store, &path).unwrap();
        assert_eq!(summary.rows, 3);

        let trades = TradeReader::new(&path).read_trades().unwrap();
        assert!(trades.iter().all(|t| t.symbol == "ETHUSDT"));
        let ids: Vec<_> = trades.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 6]);
    }

    #[test]
    fn test_export_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = ParquetExporter::new(temp_dir.path(), 10);

        let path = exporter.file_path(Utc::now());
        let summary = exporter.export(&MemoryTradeStore::new(), &path).unwrap();
        assert_eq!(summary.rows, 0);
        assert!(TradeReader::new(&path).read_trades().unwrap().is_empty());
    }
}
