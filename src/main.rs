use clap::Parser;
use price_feed::cli::{Cli, Commands};
use price_feed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: config file {} not found", cli.config);
        eprintln!("Using default configuration");
        Config::default()
    };

    // Initialize telemetry
    let _telemetry = price_feed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting ingestion and query API");
            args.execute(&config).await?;
        }
        Commands::Ingest(args) => {
            tracing::info!("Starting ingestion");
            args.execute(&config).await?;
        }
        Commands::Serve(args) => {
            tracing::info!("Starting query API");
            args.execute(&config).await?;
        }
        Commands::Price(args) => args.execute(&config).await?,
        Commands::History(args) => args.execute(&config).await?,
        Commands::Stats(args) => args.execute(&config).await?,
        Commands::Export(args) => args.execute(&config).await?,
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
