//! Quote rotation engine: selection, pacing, persistence, ingestion gate.
//!
//! The [`RotationLoop`] owns the in-memory corpus and the forbidden-tag set,
//! hands each selected quote to the render/publish collaborators and writes
//! the shrunk corpus back through the store after every consumption.

pub mod dispatch;
pub mod gate;
pub mod rotation;
pub mod selector;
pub mod types;

pub use dispatch::{Ingestor, Publisher, Renderer};
pub use gate::{prepare_corpus, run_ingestion_gate, IngestionDecision};
pub use rotation::RotationLoop;
pub use selector::{is_eligible, select_unique_with, Selector};
pub use types::*;
