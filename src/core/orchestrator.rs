//! Pipeline orchestration: reconcile and drain.
//!
//! Reconcile discovers new items per source and merges them into the
//! source's checkpoint as `pending`. Drain processes pending items through
//! the summarization backend in bounded-concurrency batches, persisting the
//! checkpoint after every batch so an interrupted run loses at most one
//! batch of bookkeeping (and the artifact short-circuit recovers even that).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, instrument};

use crate::adapters::{discover_filtered, Directives, Discovery, Summarizer};
use crate::config::ProjectConfig;
use crate::domain::{Outcome, Source, StatusCounts};
use crate::store::CheckpointStore;

use super::batch::BatchRunner;
use super::summarize::ItemSummarizer;

/// Per-source result of a reconcile run.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub source_id: String,
    pub discovered: usize,
    pub added: usize,
    pub total_known: usize,
}

/// Per-source result of a drain run.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    pub source_id: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Per-source status snapshot.
#[derive(Debug, Clone)]
pub struct SourceStatus {
    pub source_id: String,
    pub source_name: String,
    pub last_reconciled_at: Option<chrono::DateTime<Utc>>,
    pub counts: StatusCounts,
}

/// Coordinates the checkpoint store and the external adapters.
pub struct Orchestrator {
    config: ProjectConfig,
    store: CheckpointStore,
    discovery: Arc<dyn Discovery>,
    summarizer: ItemSummarizer,
}

impl Orchestrator {
    pub fn new(
        config: ProjectConfig,
        store: CheckpointStore,
        discovery: Arc<dyn Discovery>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let summarizer = ItemSummarizer::new(summarizer, store.clone());
        Self {
            config,
            store,
            discovery,
            summarizer,
        }
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Discover new items for every selected source and merge them into the
    /// checkpoints as `pending`. A failing source never aborts the others.
    #[instrument(skip(self))]
    pub async fn reconcile_all(&self, filter: Option<&str>) -> Result<Vec<ReconcileReport>> {
        let sources = self.config.enabled_sources(filter)?;
        let mut reports = Vec::new();

        for source in sources {
            let mut checkpoint = match self.store.load(source).await {
                Ok(cp) => cp,
                Err(e) => {
                    error!(source = %source.id, error = %e, "Cannot load checkpoint, skipping source");
                    continue;
                }
            };

            let keywords = source.effective_keywords(&self.config.keywords);
            let items = discover_filtered(
                self.discovery.as_ref(),
                source,
                keywords,
                self.config.settings.max_results,
            )
            .await;

            let added = checkpoint.merge_discovered(&items);
            checkpoint.last_reconciled_at = Some(Utc::now());

            if let Err(e) = self.store.save(&checkpoint).await {
                error!(source = %source.id, error = %e, "Cannot save checkpoint");
                continue;
            }

            info!(
                source = %source.id,
                discovered = items.len(),
                added,
                "Reconciled source"
            );
            reports.push(ReconcileReport {
                source_id: source.id.clone(),
                discovered: items.len(),
                added,
                total_known: checkpoint.items.len(),
            });
        }

        Ok(reports)
    }

    /// Process pending items through the summarization backend.
    ///
    /// `limit` caps the number of items *attempted* across all selected
    /// sources. The checkpoint is saved after every batch; a persistence
    /// failure abandons the rest of that source but not the other sources.
    #[instrument(skip(self))]
    pub async fn drain(
        &self,
        filter: Option<&str>,
        limit: Option<usize>,
        concurrency: usize,
        inter_batch_delay: Duration,
    ) -> Result<Vec<DrainReport>> {
        let sources = self.config.enabled_sources(filter)?;
        let runner = BatchRunner::new(concurrency, inter_batch_delay);
        let mut remaining = limit.unwrap_or(usize::MAX);
        let mut reports = Vec::new();

        for source in sources {
            if remaining == 0 {
                break;
            }

            match self.drain_source(source, &runner, &mut remaining).await {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {} // nothing pending
                Err(e) => {
                    error!(source = %source.id, error = %e, "Drain failed for source");
                }
            }
        }

        Ok(reports)
    }

    /// Drain one source, persisting after each batch. Returns `None` when
    /// the source has nothing pending (its checkpoint stays untouched).
    ///
    /// `remaining` is decremented per batch as items are attempted, before
    /// any persistence, so attempts always count against the global limit.
    /// A save failure abandons the rest of this source, but the partial
    /// report still reaches the caller's run summary.
    async fn drain_source(
        &self,
        source: &Source,
        runner: &BatchRunner,
        remaining: &mut usize,
    ) -> Result<Option<DrainReport>> {
        let mut checkpoint = self.store.load(source).await?;
        let pending = checkpoint.pending_items(*remaining);
        if pending.is_empty() {
            return Ok(None);
        }

        info!(
            source = %source.id,
            pending = pending.len(),
            concurrency = runner.concurrency(),
            "Draining source"
        );

        let directives = self.directives();
        let mut report = DrainReport {
            source_id: source.id.clone(),
            ..DrainReport::default()
        };

        let batches = runner.batches(&pending);
        let batch_count = batches.len();

        for (batch_idx, batch) in batches.into_iter().enumerate() {
            let outcomes = runner
                .run_batch(batch, |item| {
                    let summarizer = self.summarizer.clone();
                    let source = source.clone();
                    let directives = directives.clone();
                    async move { summarizer.summarize(&source, &item, &directives).await }
                })
                .await;

            report.attempted += outcomes.len();
            *remaining = remaining.saturating_sub(outcomes.len());
            for (item, outcome) in outcomes {
                let Some(record) = checkpoint.items.get_mut(&item.id) else {
                    continue;
                };
                match outcome {
                    Outcome::Success => {
                        record.mark_summarized(Utc::now());
                        report.succeeded += 1;
                    }
                    Outcome::Failure(detail) => {
                        record.mark_error(detail);
                        report.failed += 1;
                    }
                }
            }

            // Persist before moving on; losing this write costs at most one
            // batch of bookkeeping, and the artifact check recovers it.
            if let Err(e) = self.store.save(&checkpoint).await {
                error!(
                    source = %source.id,
                    error = %e,
                    "Cannot save checkpoint, abandoning source"
                );
                break;
            }

            if batch_idx + 1 < batch_count {
                runner.pause().await;
            }
        }

        Ok(Some(report))
    }

    fn directives(&self) -> Directives {
        Directives {
            // Raw template; per-item substitution happens at summarize time
            instructions: self.config.settings.prompt.clone(),
            length: self.config.settings.length,
            model: self.config.settings.model.clone(),
            timeout: self.config.settings.timeout(),
        }
    }

    /// Status snapshot per selected source.
    pub async fn status(&self, filter: Option<&str>) -> Result<Vec<SourceStatus>> {
        let sources = self.config.enabled_sources(filter)?;
        let mut statuses = Vec::new();

        for source in sources {
            let checkpoint = self.store.load(source).await?;
            statuses.push(SourceStatus {
                source_id: source.id.clone(),
                source_name: source.name.clone(),
                last_reconciled_at: checkpoint.last_reconciled_at,
                counts: checkpoint.counts(),
            });
        }

        Ok(statuses)
    }

    /// Reset checkpoints. With `errors_only`, flips `error` records back to
    /// `pending`; otherwise clears the item mapping entirely.
    pub async fn reset(&self, filter: Option<&str>, errors_only: bool) -> Result<usize> {
        let sources = self.config.enabled_sources(filter)?;
        let mut affected = 0;

        for source in sources {
            if errors_only {
                let mut checkpoint = self.store.load(source).await?;
                let reset = checkpoint.reset_errors();
                if reset > 0 {
                    self.store.save(&checkpoint).await?;
                }
                affected += reset;
                info!(source = %source.id, reset, "Reset errored items");
            } else {
                let before = self.store.load(source).await?.items.len();
                self.store.reset(source).await?;
                affected += before;
                info!(source = %source.id, cleared = before, "Cleared checkpoint");
            }
        }

        Ok(affected)
    }
}
