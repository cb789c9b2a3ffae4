//! Quotecast Core: error type, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{ChannelId, DataPaths, QuotecastConfig};
pub use error::{Error, Result};
