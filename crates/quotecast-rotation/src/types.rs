//! Rotation types.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use quotecast_store::Quote;

/// Where the rotation loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    Idle,
    Selecting,
    Dispatching,
    Persisting,
    Pacing,
    /// Corpus exhausted or retries given up.
    Finished,
}

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct RotationOptions {
    /// Delay after each consumed quote.
    pub interval: Duration,
    /// Consecutive selection misses before giving up; 0 retries forever.
    pub max_selection_misses: u32,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_selection_misses: 100,
        }
    }
}

/// Result of the render-then-publish step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Published { artifact: PathBuf },
    RenderFailed(String),
    PublishFailed { artifact: PathBuf, error: String },
}

impl DispatchOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, DispatchOutcome::Published { .. })
    }
}

/// Result of a single loop iteration.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// A quote was selected, dispatched (best-effort) and removed.
    Consumed {
        quote: Quote,
        dispatch: DispatchOutcome,
        saved: bool,
    },
    /// Every remaining quote carries a forbidden tag.
    NoUniqueQuote,
    /// The corpus is empty.
    Exhausted,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "reason")]
pub enum RotationEnd {
    Exhausted,
    Stalled { remaining: usize },
}

/// Counters for one run. Logged as JSON when the run ends.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RotationReport {
    pub consumed: usize,
    pub published: usize,
    #[serde(rename = "dispatchFailures")]
    pub dispatch_failures: usize,
    #[serde(rename = "saveFailures")]
    pub save_failures: usize,
    #[serde(rename = "selectionMisses")]
    pub selection_misses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<RotationEnd>,
}
