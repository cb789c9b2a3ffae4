//! Ingestion gate: run the one-time ingestion unless the marker says it already ran.

use tracing::info;

use quotecast_core::Result;
use quotecast_store::{CorpusStore, Quote, RunStateMarker};

use crate::dispatch::Ingestor;

/// What the gate decided on this start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionDecision {
    Skipped,
    Ingested { quotes: usize },
}

/// Ingest when the marker is absent, then create it. Ingestion failure is returned as-is
/// and leaves the marker absent.
pub async fn run_ingestion_gate(
    marker: &RunStateMarker,
    store: &CorpusStore,
    ingestor: &dyn Ingestor,
) -> Result<IngestionDecision> {
    if marker.is_present() {
        info!("Parser has already been run. Skipping parsing.");
        return Ok(IngestionDecision::Skipped);
    }

    let quotes = ingestor.ingest(store).await?;
    info!("Quotes saved to {} ({} quotes)", store.path().display(), quotes);
    marker.create()?;
    Ok(IngestionDecision::Ingested { quotes })
}

/// Startup sequence: gate, then load the corpus from disk.
pub async fn prepare_corpus(
    store: &CorpusStore,
    marker: &RunStateMarker,
    ingestor: &dyn Ingestor,
) -> Result<Vec<Quote>> {
    run_ingestion_gate(marker, store, ingestor).await?;
    store.load()
}
