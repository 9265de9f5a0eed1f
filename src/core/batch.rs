//! Bounded-concurrency batch execution.
//!
//! Input is partitioned into contiguous batches of `concurrency` items.
//! Batches run strictly in sequence; items within a batch run concurrently
//! and independently, so one failure never cancels its siblings. The caller
//! drives the loop batch by batch and persists between batches, which is
//! what keeps a mid-run crash from losing more than one batch of progress.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::debug;

use crate::domain::Outcome;

/// Executes item operations with a concurrency bound and inter-batch delay.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    concurrency: usize,
    inter_batch_delay: Duration,
}

impl BatchRunner {
    /// Concurrency is clamped to at least 1.
    pub fn new(concurrency: usize, inter_batch_delay: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            inter_batch_delay,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Partition items into contiguous batches of `concurrency`; the last
    /// batch may be smaller. Batch order matches input order.
    pub fn batches<T: Clone>(&self, items: &[T]) -> Vec<Vec<T>> {
        items.chunks(self.concurrency).map(|c| c.to_vec()).collect()
    }

    /// Run one batch concurrently, returning an outcome per item in the
    /// batch's input order. Completion order within the batch is
    /// unspecified; results are reassembled by position.
    pub async fn run_batch<T, F, Fut>(&self, batch: Vec<T>, op: F) -> Vec<(T, Outcome)>
    where
        T: Clone + Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let mut set = JoinSet::new();
        let mut task_slots = HashMap::new();
        for (index, item) in batch.iter().enumerate() {
            let fut = op(item.clone());
            let handle = set.spawn(async move { (index, fut.await) });
            task_slots.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<Outcome>> = vec![None; batch.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => {
                    // A panicked task counts as a failed item; the rest of
                    // the batch is unaffected. The task id maps the panic
                    // back to the item that caused it.
                    debug!(error = %e, "Batch task panicked");
                    if let Some(&index) = task_slots.get(&e.id()) {
                        slots[index] = Some(Outcome::Failure(format!("task panicked: {}", e)));
                    }
                }
            }
        }

        batch
            .into_iter()
            .zip(slots)
            .map(|(item, outcome)| {
                (
                    item,
                    outcome.unwrap_or_else(|| Outcome::Failure("task vanished".to_string())),
                )
            })
            .collect()
    }

    /// Inter-batch pause. The caller skips this after the final batch.
    pub async fn pause(&self) {
        if !self.inter_batch_delay.is_zero() {
            tokio::time::sleep(self.inter_batch_delay).await;
        }
    }
}
