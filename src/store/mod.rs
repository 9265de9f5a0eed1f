//! Checkpoint persistence.
//!
//! Each source owns one directory under the output root:
//!
//! ```text
//! <root>/<source_id>/checkpoint.json
//! <root>/<source_id>/summaries/<item_id>.md
//! ```
//!
//! Saves go through a temp file plus rename so a reader never observes a
//! partially written checkpoint. A missing checkpoint is a fresh start; a
//! malformed one is a hard error, since silently discarding progress would
//! re-bill every completed item.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::domain::{Checkpoint, Source};

/// Errors from checkpoint persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed checkpoint {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Filesystem-backed checkpoint store rooted at the project output directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by one source.
    pub fn source_dir(&self, source_id: &str) -> PathBuf {
        self.root.join(source_id)
    }

    fn checkpoint_path(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join("checkpoint.json")
    }

    /// Directory holding one source's summary artifacts.
    pub fn summaries_dir(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join("summaries")
    }

    /// Artifact path for one item.
    pub fn summary_path(&self, source_id: &str, item_id: &str) -> PathBuf {
        self.summaries_dir(source_id).join(format!("{}.md", item_id))
    }

    /// Load a source's checkpoint, or a fresh empty one if none exists yet.
    pub async fn load(&self, source: &Source) -> Result<Checkpoint, StoreError> {
        let path = self.checkpoint_path(&source.id);

        if !path.exists() {
            return Ok(Checkpoint::new(source));
        }

        let content = fs::read_to_string(&path).await?;
        serde_json::from_str(&content).map_err(|e| StoreError::Malformed { path, source: e })
    }

    /// Persist a checkpoint atomically (temp file in the same directory,
    /// then rename over the target).
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        let dir = self.source_dir(&checkpoint.source_id);
        fs::create_dir_all(&dir).await?;

        let content = serde_json::to_string_pretty(checkpoint)?;
        let path = self.checkpoint_path(&checkpoint.source_id);

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Clear a source's item records and last-reconciled timestamp, keeping
    /// its identity fields. Persists immediately.
    pub async fn reset(&self, source: &Source) -> Result<Checkpoint, StoreError> {
        let mut checkpoint = self.load(source).await?;
        checkpoint.items.clear();
        checkpoint.last_reconciled_at = None;
        self.save(&checkpoint).await?;
        Ok(checkpoint)
    }
}
