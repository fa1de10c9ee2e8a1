//! Data export module
//!
//! Dumps stored trades to Parquet for offline analysis

mod parquet;

pub use parquet::{trade_schema, ExportSummary, ParquetExporter, TradeReader};
