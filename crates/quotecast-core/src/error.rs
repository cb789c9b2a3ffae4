//! Error types for Quotecast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid corpus: {0}")]
    InvalidCorpus(String),

    #[error("No unique quote available")]
    NoUniqueQuoteAvailable,

    #[error("Render error: {0}")]
    Render(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for failures that mean the corpus file could not be parsed.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Json(_) | Error::InvalidCorpus(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
