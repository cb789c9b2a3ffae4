//! Collaborators for the rotation engine: AZQuotes ingestion, Unsplash photo
//! cards, Telegram channel publishing.
//!
//! Each type implements one of the `quotecast-rotation` collaborator traits.
//! All network calls go through `reqwest`; none of them carry a timeout.

pub mod azquotes;
pub mod telegram;
pub mod types;
pub mod unsplash;

pub use azquotes::AzQuotesIngestor;
pub use telegram::TelegramPublisher;
pub use types::*;
pub use unsplash::UnsplashRenderer;
