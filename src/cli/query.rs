//! One-shot query commands

use super::open_store;
use crate::config::Config;
use crate::query::QueryService;
use crate::time_format;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct PriceArgs {
    /// Trading symbol, e.g. BTCUSDT
    pub symbol: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Trading symbol, e.g. BTCUSDT
    pub symbol: String,

    /// Window start, `YYYY-MM-DD HH:MM:SS` (UTC)
    #[arg(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// Window end, `YYYY-MM-DD HH:MM:SS` (UTC)
    #[arg(long, value_parser = parse_time)]
    pub end: DateTime<Utc>,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: u64,

    /// Page size, defaults to `api.default_per_page`
    #[arg(long)]
    pub per_page: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Trading symbol, e.g. BTCUSDT
    pub symbol: String,

    /// Window start, `YYYY-MM-DD HH:MM:SS` (UTC)
    #[arg(long, value_parser = parse_time, requires = "end")]
    pub start: Option<DateTime<Utc>>,

    /// Window end, `YYYY-MM-DD HH:MM:SS` (UTC)
    #[arg(long, value_parser = parse_time, requires = "start")]
    pub end: Option<DateTime<Utc>>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    time_format::parse(raw).map_err(|_| format!("expected {}", time_format::WIRE_FORMAT))
}

fn service(config: &Config) -> anyhow::Result<QueryService> {
    Ok(QueryService::new(open_store(&config.store)?))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl PriceArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let price = service(config)?.current_price(&self.symbol)?;
        print_json(&price)
    }
}

impl HistoryArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let per_page = self.per_page.unwrap_or(config.api.default_per_page);
        let page =
            service(config)?.historical_range(&self.symbol, self.start, self.end, self.page, per_page)?;
        print_json(&page)
    }
}

impl StatsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let stats = service(config)?.statistical_analysis(&self.symbol, self.start, self.end)?;
        print_json(&stats)
    }
}
