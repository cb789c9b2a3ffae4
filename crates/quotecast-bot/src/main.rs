//! Quotecast: publishes generated quote cards to a channel at a fixed pace.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quotecast_connectors::unsplash::load_font;
use quotecast_connectors::{AzQuotesIngestor, TelegramPublisher, UnsplashRenderer};
use quotecast_core::{DataPaths, QuotecastConfig};
use quotecast_rotation::{prepare_corpus, RotationEnd, RotationLoop, RotationOptions};
use quotecast_store::{CorpusStore, RunStateMarker};

mod status;

fn resolve_data_dir() -> PathBuf {
    std::env::var("QUOTECAST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Handle CLI subcommands
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "status" | "--status" => {
                let data_dir = if args.len() > 2 {
                    PathBuf::from(&args[2])
                } else {
                    resolve_data_dir()
                };
                let report = status::inspect(&data_dir);
                status::print_report(&report);
                std::process::exit(if report.corpus_valid { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("Quotecast: quote cards on a schedule");
                println!();
                println!("Usage: quotecast [command]");
                println!();
                println!("Commands:");
                println!("  (none)                   Ingest if needed, then run the rotation");
                println!("  status [data-dir]        Show remaining corpus and ingestion state");
                println!("  help                     Show this help message");
                println!();
                println!("Environment:");
                println!("  CONFIG_PATH              Config file (default configs/config.json)");
                println!("  QUOTECAST_DATA_DIR       Data directory (default data)");
                println!("  RUST_LOG                 Log filter (default info)");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'quotecast help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Load config
    let config_path = QuotecastConfig::resolve_path();
    let config = QuotecastConfig::load(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let paths = DataPaths::new(&data_dir)?;

    // Connect collaborators
    let font = load_font(&config.font_path)?;
    let publisher = TelegramPublisher::connect(config.bot_token()).await?;
    let renderer = UnsplashRenderer::new(config.access_key(), &paths.results_dir, font);
    let ingestor = AzQuotesIngestor::new(&config.index_url)?;

    // Ingest once, then load the corpus
    let store = CorpusStore::new(&paths.corpus_file);
    let marker = RunStateMarker::new(&paths.marker_file);
    let corpus = prepare_corpus(&store, &marker, &ingestor).await?;

    // Run the rotation
    let options = RotationOptions {
        interval: config.pacing(),
        max_selection_misses: config.max_selection_misses,
    };
    let rotation = RotationLoop::new(
        corpus,
        store,
        Arc::new(renderer),
        Arc::new(publisher),
        config.channel(),
        options,
    );

    let report = rotation.run().await;
    info!("Rotation report: {}", serde_json::to_string(&report)?);
    if let Some(RotationEnd::Stalled { remaining }) = report.end {
        warn!(
            "Stopped with {} quotes left: every remaining quote repeats a used tag",
            remaining
        );
    }

    Ok(())
}
