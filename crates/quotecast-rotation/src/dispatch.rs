//! Collaborator traits consumed by the engine.
//!
//! Implementations live in `quotecast-connectors`; tests supply fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use quotecast_core::{ChannelId, Result};
use quotecast_store::{CorpusStore, Quote};

/// Produces a visual artifact for a quote and returns where it was written.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, quote: &Quote) -> Result<PathBuf>;
}

/// Delivers an artifact to a channel, annotated with the quote's tags.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &ChannelId, artifact: &Path, tags: &[String]) -> Result<()>;
}

/// Populates the corpus store from a remote source. Returns the number of quotes written.
#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn ingest(&self, store: &CorpusStore) -> Result<usize>;
}
