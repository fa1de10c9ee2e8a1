//! Export command implementation

use super::open_store;
use crate::config::Config;
use crate::data::ParquetExporter;
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output directory for the Parquet file
    #[arg(short, long, default_value = "./data")]
    pub output: PathBuf,

    /// Only export this symbol
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Rows read from the store per batch
    #[arg(short, long, default_value_t = 10_000)]
    pub batch_size: u64,
}

impl ExportArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store = open_store(&config.store)?;

        let mut exporter = ParquetExporter::new(&self.output, self.batch_size);
        if let Some(symbol) = &self.symbol {
            exporter = exporter.with_symbol(symbol.clone());
        }
        let path = exporter.file_path(Utc::now());

        let summary =
            tokio::task::spawn_blocking(move || exporter.export(store.as_ref(), &path)).await??;

        println!(
            "Exported {} trades in {} batches to {}",
            summary.rows,
            summary.batches,
            summary.path.display()
        );
        Ok(())
    }
}
