//! Long-running commands: ingestion and the query API

use super::open_store;
use crate::api;
use crate::config::Config;
use crate::feed::{ConnectorSettings, FeedConnector};
use crate::query::QueryService;
use crate::store::TradeStore;
use crate::ws::{WsConfig, WsTransport};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the API listen address
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Override the subscribed symbols (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the API listen address
    #[arg(short, long)]
    pub bind: Option<String>,
}

fn connector(config: &Config, store: Arc<dyn TradeStore>) -> FeedConnector<WsTransport> {
    let transport = WsTransport::new(WsConfig::from(&config.feed));
    FeedConnector::new(transport, store, ConnectorSettings::from(&config.feed))
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store: Arc<dyn TradeStore> = open_store(&config.store)?;
        let bind = self.bind.as_deref().unwrap_or(&config.api.bind);

        let feed = tokio::spawn(connector(config, store.clone()).run());
        let service = QueryService::new(store);

        tokio::select! {
            result = api::serve(bind, service, config.api.default_per_page) => result?,
            result = feed => {
                if let Err(e) = result {
                    anyhow::bail!("feed connector task failed: {e}");
                }
            }
        }

        Ok(())
    }
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store: Arc<dyn TradeStore> = open_store(&config.store)?;

        let mut config = config.clone();
        if !self.symbols.is_empty() {
            config.feed.symbols = self.symbols.clone();
            config.validate()?;
        }

        connector(&config, store).run().await;
        Ok(())
    }
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let store: Arc<dyn TradeStore> = open_store(&config.store)?;
        let bind = self.bind.as_deref().unwrap_or(&config.api.bind);

        api::serve(bind, QueryService::new(store), config.api.default_per_page).await
    }
}
