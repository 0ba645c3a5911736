use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use card_valuator::api::state::AppState;
use card_valuator::config::AppConfig;
use card_valuator::service::Valuator;
use card_valuator::store::{CatalogStore, MemoryStore};
use card_valuator::upstream::CardDbClient;

#[derive(Parser)]
#[command(name = "card-valuator")]
#[command(about = "Card and pack valuation service driven by community decklist usage")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Drop cached and derived collections before serving
        #[arg(long)]
        reset: bool,
    },

    /// Run one full refresh and print what was fetched
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting card-valuator v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("loading config from {:?}", cli.config))?
    } else {
        AppConfig::default()
    };

    // Environment overrides for the operational knobs.
    if let Ok(epoch) = std::env::var("CRAWL_FROM_DATE") {
        config.valuation.crawl_epoch = epoch;
    }
    config.validate().context("validating configuration")?;

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let upstream = Arc::new(
        CardDbClient::new(config.upstream.client_config()?).context("building upstream client")?,
    );
    let valuator = Arc::new(Valuator::new(
        store.clone(),
        upstream,
        config.valuation.sync_config()?,
    ));

    match cli.command {
        Commands::Serve { host, port, reset } => {
            if reset {
                tracing::warn!("Resetting all cached and derived collections");
                store.clear().await?;
            }

            let state = AppState { valuator };
            let app = card_valuator::api::build_router(state);

            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Sync => {
            tracing::info!("Running one-time sync...");
            valuator.sync_now().await?;

            println!("\n=== Sync Results ===");
            println!("Packs:       {}", store.all_packs().await?.len());
            println!("Cards:       {}", store.all_cards().await?.len());
            println!("Heroes:      {}", store.all_heroes().await?.len());
            println!("Decks:       {}", store.all_decks().await?.len());
            println!("Card values: {}", store.all_card_values().await?.len());
            println!("Pack values: {}", store.all_pack_values().await?.len());
        }
    }

    Ok(())
}
