//! Run-state marker: an empty file whose presence means ingestion already ran.

use std::path::{Path, PathBuf};

use tracing::info;

use quotecast_core::Result;

#[derive(Debug, Clone)]
pub struct RunStateMarker {
    path: PathBuf,
}

impl RunStateMarker {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.path.exists()
    }

    /// Create the marker. Existing markers are left untouched.
    pub fn create(&self) -> Result<()> {
        if self.is_present() {
            return Ok(());
        }
        std::fs::File::create(&self.path)?;
        info!("Run-state marker created at {}", self.path.display());
        Ok(())
    }
}
