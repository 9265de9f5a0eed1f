//! The summarization step for one item: prompt templating, the idempotence
//! short-circuit, and artifact persistence.
//!
//! The on-disk artifact is the source of truth for "already summarized":
//! if the artifact exists, the expensive backend call is skipped even when
//! the checkpoint record has not caught up (e.g. after a crash between the
//! artifact write and the checkpoint save).

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, warn};

use crate::adapters::{Directives, Summarizer};
use crate::domain::{Item, Outcome, Source};
use crate::store::CheckpointStore;

/// Maximum failure-detail length shown in logs; the full text still lands
/// on the item record.
const DISPLAY_DETAIL_MAX: usize = 200;

/// Substitute `{title}` and `{source}` in an instruction template.
pub fn render_prompt(template: &str, title: &str, source_name: &str) -> String {
    template
        .replace("{title}", title)
        .replace("{source}", source_name)
}

/// Truncate failure detail for display, marking the cut.
pub fn display_detail(detail: &str) -> String {
    if detail.len() <= DISPLAY_DETAIL_MAX {
        return detail.to_string();
    }
    let cut = detail
        .char_indices()
        .take_while(|(i, _)| *i < DISPLAY_DETAIL_MAX)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    format!("{}… [truncated]", &detail[..cut])
}

/// Render the fixed metadata header prepended to every artifact.
pub fn render_header(source: &Source, item: &Item, completed_at: DateTime<Utc>) -> String {
    format!(
        "---\nitem: {}\ntitle: {}\nurl: {}\nsource: {}\ncompleted: {}\n---\n\n",
        item.id,
        item.title,
        item.url,
        source.id,
        completed_at.to_rfc3339()
    )
}

/// Split an artifact into its header fields and body. Artifacts without a
/// header block come back with no fields and the full text as body.
pub fn split_header(content: &str) -> (Vec<(String, String)>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (Vec::new(), content);
    };
    let Some(end) = rest.find("\n---\n") else {
        return (Vec::new(), content);
    };

    let fields = rest[..end]
        .lines()
        .filter_map(|line| {
            line.split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect();

    let body = rest[end + "\n---\n".len()..].trim_start_matches('\n');
    (fields, body)
}

/// Drives one item through the summarization backend and persists the result.
#[derive(Clone)]
pub struct ItemSummarizer {
    service: Arc<dyn Summarizer>,
    store: CheckpointStore,
}

impl ItemSummarizer {
    pub fn new(service: Arc<dyn Summarizer>, store: CheckpointStore) -> Self {
        Self { service, store }
    }

    /// Summarize one item, returning the per-item outcome.
    ///
    /// Renders the instruction template for this item, short-circuits to
    /// success when the artifact already exists on disk, and otherwise
    /// invokes the backend and persists the artifact. Failures carry the
    /// full detail; logging shows a truncated form.
    pub async fn summarize(
        &self,
        source: &Source,
        item: &Item,
        directives: &Directives,
    ) -> Outcome {
        let artifact_path = self.store.summary_path(&source.id, &item.id);
        if artifact_path.exists() {
            debug!(item = %item.id, "Artifact already exists, skipping backend call");
            return Outcome::Success;
        }

        let rendered = Directives {
            instructions: render_prompt(&directives.instructions, &item.title, &source.name),
            ..directives.clone()
        };

        let summary = match self.service.summarize(item, &rendered).await {
            Ok(text) => text,
            Err(e) => {
                let detail = format!("{:#}", e);
                warn!(item = %item.id, error = %display_detail(&detail), "Summarization failed");
                return Outcome::Failure(detail);
            }
        };

        match self.persist(source, item, &summary).await {
            Ok(()) => Outcome::Success,
            Err(e) => {
                let detail = format!("failed to write artifact: {:#}", e);
                warn!(item = %item.id, error = %display_detail(&detail), "Artifact write failed");
                Outcome::Failure(detail)
            }
        }
    }

    async fn persist(&self, source: &Source, item: &Item, summary: &str) -> Result<()> {
        let dir = self.store.summaries_dir(&source.id);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = self.store.summary_path(&source.id, &item.id);
        let content = format!("{}{}\n", render_header(source, item, Utc::now()), summary);
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
