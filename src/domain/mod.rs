//! Data structures for sources, items, and checkpoints.

mod checkpoint;
mod source;

pub use checkpoint::{Checkpoint, ItemRecord, ItemStatus, StatusCounts};
pub use source::{Item, LengthClass, Source, SourceKind};

/// Result of attempting the summarization step for one item.
///
/// Expected, frequent failures travel as values rather than errors so a
/// single bad item never aborts its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}
