//! Quote model and on-disk state: the corpus file and the run-state marker.

pub mod corpus;
pub mod marker;
pub mod types;

pub use corpus::CorpusStore;
pub use marker::RunStateMarker;
pub use types::*;
