//! distill - checkpointed batch summarization of content sources
//!
//! A CLI tool that discovers items (videos, episodes) from configured
//! sources, runs each through an expensive external summarization step, and
//! tracks per-item progress in durable checkpoints so interrupted runs
//! resume without redoing completed work.
//!
//! # Architecture
//!
//! - Per-source checkpoints record every known item and its status
//!   (`pending`, `summarized`, `error`, `skipped`)
//! - `reconcile` discovers new items and merges them as `pending`
//! - `drain` summarizes pending items in bounded-concurrency batches,
//!   persisting the checkpoint after every batch
//! - Artifacts on disk short-circuit the expensive call, so work already
//!   done survives even a checkpoint write that was lost to a crash
//!
//! # Modules
//!
//! - `adapters`: the external discovery and summarization subprocesses
//! - `core`: batch execution, orchestration, combining
//! - `domain`: sources, items, checkpoints, the status state machine
//! - `store`: checkpoint persistence
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Discover new items for all enabled sources
//! distill reconcile-all
//!
//! # Summarize up to 10 pending items, 3 at a time
//! distill drain --limit 10 --concurrency 3
//!
//! # Render everything into one document
//! distill combine -o digest.md
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::{ProjectConfig, Settings};
pub use core::{BatchRunner, Orchestrator};
pub use domain::{Checkpoint, Item, ItemRecord, ItemStatus, Outcome, Source};
pub use store::CheckpointStore;
