//! CLI interface for price-feed
//!
//! Provides subcommands for:
//! - `run`: Ingestion plus the query API
//! - `ingest`: Feed connector only
//! - `serve`: Query API only
//! - `price`, `history`, `stats`: One-shot queries printed as JSON
//! - `export`: Dump stored trades to Parquet
//! - `config`: Show the effective configuration

mod export;
mod query;
mod run;

pub use export::ExportArgs;
pub use query::{HistoryArgs, PriceArgs, StatsArgs};
pub use run::{IngestArgs, RunArgs, ServeArgs};

use crate::config::StoreConfig;
use crate::store::SqliteTradeStore;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "price-feed")]
#[command(about = "Binance trade ingestion with a price query API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest trades and serve the query API
    Run(RunArgs),
    /// Ingest trades only
    Ingest(IngestArgs),
    /// Serve the query API only
    Serve(ServeArgs),
    /// Print the latest price for a symbol
    Price(PriceArgs),
    /// Print one page of trade history
    History(HistoryArgs),
    /// Print summary statistics for a symbol
    Stats(StatsArgs),
    /// Export stored trades to Parquet
    Export(ExportArgs),
    /// Show configuration
    Config,
}

/// Open the configured SQLite trade store
pub(crate) fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<SqliteTradeStore>> {
    Ok(Arc::new(SqliteTradeStore::open(&config.path, config.pool_size)?))
}
