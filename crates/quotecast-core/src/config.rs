//! Configuration and data directory management.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.json";
pub const DEFAULT_PACING_SECS: u64 = 30;
pub const DEFAULT_MAX_SELECTION_MISSES: u32 = 100;
pub const DEFAULT_INDEX_URL: &str = "https://www.azquotes.com/quotes/topics/index.html";
pub const DEFAULT_FONT_PATH: &str = "fonts/Cheri.ttf";

/// Paths to all Quotecast data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Persisted corpus (`data/quotes.json`).
    pub corpus_file: PathBuf,
    /// Ingestion-completed marker (`data/parser_completed.flag`).
    pub marker_file: PathBuf,
    /// Rendered artifacts (`data/Resulted/`).
    pub results_dir: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let paths = Self::layout(root);
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Paths under `root` without touching the filesystem.
    pub fn layout(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            corpus_file: root.join("quotes.json"),
            marker_file: root.join("parser_completed.flag"),
            results_dir: root.join("Resulted"),
            root,
        }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }
}

/// Destination channel: a numeric chat id or an `@handle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Id(i64),
    Handle(String),
}

impl ChannelId {
    /// Parse from free text (env vars): numbers become `Id`, everything else `Handle`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => ChannelId::Id(id),
            Err(_) => ChannelId::Handle(raw.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, ChannelId::Handle(h) if h.is_empty())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Id(id) => write!(f, "{}", id),
            ChannelId::Handle(h) => f.write_str(h),
        }
    }
}

/// Top-level Quotecast configuration (persisted as JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotecastConfig {
    #[serde(default, rename = "channelID", alias = "channel_id")]
    pub channel_id: Option<ChannelId>,
    #[serde(default, rename = "botToken", alias = "bot_token")]
    pub bot_token: Option<String>,
    /// Photo provider access key.
    #[serde(default, rename = "accessKey", alias = "access_key")]
    pub access_key: Option<String>,
    /// Seconds to wait between publishes.
    #[serde(default = "default_pacing_secs", rename = "pacingSecs", alias = "pacing_secs")]
    pub pacing_secs: u64,
    /// Consecutive selection misses before the rotation gives up; 0 = never.
    #[serde(
        default = "default_max_selection_misses",
        rename = "maxSelectionMisses",
        alias = "max_selection_misses"
    )]
    pub max_selection_misses: u32,
    #[serde(default = "default_index_url", rename = "indexUrl", alias = "index_url")]
    pub index_url: String,
    /// TrueType font used to draw the quote onto the card.
    #[serde(default = "default_font_path", rename = "fontPath", alias = "font_path")]
    pub font_path: PathBuf,
}

fn default_pacing_secs() -> u64 {
    DEFAULT_PACING_SECS
}
fn default_max_selection_misses() -> u32 {
    DEFAULT_MAX_SELECTION_MISSES
}
fn default_index_url() -> String {
    DEFAULT_INDEX_URL.into()
}
fn default_font_path() -> PathBuf {
    PathBuf::from(DEFAULT_FONT_PATH)
}

impl QuotecastConfig {
    /// Path from `CONFIG_PATH`, falling back to `configs/config.json`.
    pub fn resolve_path() -> PathBuf {
        std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load config from file, filling missing secrets from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup.
    pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config: QuotecastConfig = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if config.bot_token.is_none() {
            config.bot_token = env("QUOTECAST_BOT_TOKEN");
        }
        if config.access_key.is_none() {
            config.access_key = env("UNSPLASH_ACCESS_KEY");
        }
        if config.channel_id.is_none() {
            config.channel_id = env("QUOTECAST_CHANNEL_ID").map(|c| ChannelId::parse(&c));
        }

        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match &self.channel_id {
            Some(c) if !c.is_empty() => {}
            _ => return Err(Error::Config("channelID is required".into())),
        }
        if self.bot_token.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Config("botToken is required".into()));
        }
        if self.access_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Config("accessKey is required".into()));
        }
        Ok(())
    }

    pub fn channel(&self) -> ChannelId {
        self.channel_id
            .clone()
            .unwrap_or_else(|| ChannelId::Handle(String::new()))
    }

    pub fn bot_token(&self) -> &str {
        self.bot_token.as_deref().unwrap_or_default()
    }

    pub fn access_key(&self) -> &str {
        self.access_key.as_deref().unwrap_or_default()
    }

    pub fn pacing(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pacing_secs)
    }
}
