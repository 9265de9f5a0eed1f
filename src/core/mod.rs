//! Orchestration logic.
//!
//! - `batch`: bounded-concurrency batch executor
//! - `summarize`: per-item summarization with idempotent artifact writes
//! - `orchestrator`: reconcile and drain over all sources
//! - `combine`: render all artifacts into one document

pub mod batch;
pub mod combine;
pub mod orchestrator;
pub mod summarize;

pub use batch::BatchRunner;
pub use combine::combine;
pub use orchestrator::{DrainReport, Orchestrator, ReconcileReport, SourceStatus};
pub use summarize::ItemSummarizer;
