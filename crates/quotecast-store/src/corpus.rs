//! JSON-file corpus store.
//!
//! The file is a JSON array of quote records. Every save is a full replace:
//! the new contents go to a sibling temp file which is then renamed over the
//! corpus file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::types::Quote;
use quotecast_core::{Error, Result};

/// Durable home of the not-yet-consumed quotes.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the corpus. Fails if the file is missing, unreadable,
    /// not a JSON array of quotes, or holds a quote with empty author or text.
    pub fn load(&self) -> Result<Vec<Quote>> {
        let data = std::fs::read_to_string(&self.path)?;
        let quotes: Vec<Quote> = serde_json::from_str(&data)?;

        for (idx, quote) in quotes.iter().enumerate() {
            if quote.author.trim().is_empty() {
                return Err(Error::InvalidCorpus(format!("entry {} has no author", idx)));
            }
            if quote.text.trim().is_empty() {
                return Err(Error::InvalidCorpus(format!("entry {} has no quote text", idx)));
            }
        }

        info!(
            "Corpus loaded: {} quotes from {}",
            quotes.len(),
            self.path.display()
        );
        Ok(quotes)
    }

    /// Replace the stored corpus with `quotes`, preserving their order.
    pub fn save(&self, quotes: &[Quote]) -> Result<()> {
        let json = serde_json::to_string_pretty(quotes)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Corpus saved: {} quotes", quotes.len());
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "quotes.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (CorpusStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("quotes.json"));
        (store, dir)
    }

    fn sample() -> Vec<Quote> {
        vec![
            Quote::new("A", "x", vec!["t1".into(), "t0".into()]),
            Quote::new("B", "y", vec![]),
            Quote::new("C", "z", vec!["t1".into()]),
        ]
    }

    #[test]
    fn test_save_and_load() {
        let (store, _dir) = test_store();
        store.save(&sample()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, sample());
        assert_eq!(loaded[0].tags, vec!["t1".to_string(), "t0".to_string()]);
        assert_eq!(loaded[2].author, "C");
    }

    #[test]
    fn test_save_replaces_contents() {
        let (store, _dir) = test_store();
        store.save(&sample()).unwrap();
        store.save(&sample()[1..2]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].author, "B");
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_load_missing_file() {
        let (store, _dir) = test_store();
        assert!(!store.exists());
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_load_malformed() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), r#"{"author": "A"}"#).unwrap();
        let err = store.load().unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_load_rejects_empty_author() {
        let (store, _dir) = test_store();
        std::fs::write(store.path(), r#"[{"author": " ", "quote": "x", "tags": []}]"#).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::InvalidCorpus(_)));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = CorpusStore::new(dir.path().join("gone").join("quotes.json"));
        let err = store.save(&sample()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_corpus_round_trip() {
        let (store, _dir) = test_store();
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
