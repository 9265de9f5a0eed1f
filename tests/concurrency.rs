//! Concurrency-bound tests for the drain path.
//!
//! The summarizer stub tracks how many calls are in flight at once; for any
//! configured concurrency P, the high-water mark must never exceed P.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use distill::adapters::{Directives, Discovery, Summarizer};
use distill::config::{ProjectConfig, Settings};
use distill::core::Orchestrator;
use distill::domain::{Item, ItemStatus, Source};
use distill::store::CheckpointStore;

struct FixedDiscovery {
    items: Vec<Item>,
}

#[async_trait]
impl Discovery for FixedDiscovery {
    async fn discover(&self, _source: &Source, max_results: usize) -> Result<Vec<Item>> {
        let mut items = self.items.clone();
        items.truncate(max_results);
        Ok(items)
    }
}

/// Summarizer stub measuring concurrent in-flight calls.
struct GaugedSummarizer {
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl GaugedSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Summarizer for GaugedSummarizer {
    async fn summarize(&self, item: &Item, _directives: &Directives) -> Result<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(15)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("summary of {}", item.id))
    }
}

fn fixture(temp: &TempDir, item_count: usize) -> (ProjectConfig, Arc<FixedDiscovery>) {
    let items = (0..item_count)
        .map(|i| Item {
            id: format!("v{:02}", i),
            title: format!("Item {}", i),
            description: String::new(),
            url: format!("https://example.com/watch/v{:02}", i),
        })
        .collect();

    let config = ProjectConfig {
        project: "test".to_string(),
        keywords: Vec::new(),
        sources: vec![Source {
            id: "s1".to_string(),
            name: "Source".to_string(),
            url: "https://example.com/s1".to_string(),
            kind: None,
            enabled: true,
            keywords: None,
            tags: Vec::new(),
        }],
        settings: Settings {
            max_results: item_count,
            output_dir: Some(temp.path().to_path_buf()),
            ..Settings::default()
        },
    };

    (config, Arc::new(FixedDiscovery { items }))
}

async fn drain_with_concurrency(item_count: usize, concurrency: usize) -> (usize, usize) {
    let temp = TempDir::new().unwrap();
    let (config, discovery) = fixture(&temp, item_count);
    let summarizer = GaugedSummarizer::new();
    let store = CheckpointStore::new(config.output_root().unwrap());
    let orch = Orchestrator::new(config, store, discovery, summarizer.clone());

    orch.reconcile_all(None).await.unwrap();
    let reports = orch
        .drain(None, None, concurrency, Duration::ZERO)
        .await
        .unwrap();

    let attempted = reports.iter().map(|r| r.attempted).sum();
    (attempted, summarizer.high_water.load(Ordering::SeqCst))
}

#[tokio::test]
async fn test_in_flight_calls_never_exceed_concurrency() {
    let (attempted, high_water) = drain_with_concurrency(10, 3).await;
    assert_eq!(attempted, 10);
    assert!(high_water <= 3, "high water {} exceeded bound 3", high_water);
}

#[tokio::test]
async fn test_concurrency_one_is_strictly_sequential() {
    let (attempted, high_water) = drain_with_concurrency(5, 1).await;
    assert_eq!(attempted, 5);
    assert_eq!(high_water, 1);
}

#[tokio::test]
async fn test_large_concurrency_runs_everything_in_one_batch() {
    let (attempted, high_water) = drain_with_concurrency(4, 16).await;
    assert_eq!(attempted, 4);
    assert!(high_water <= 4);
}

/// Summarizer stub that completes immediately, so virtual elapsed time
/// comes from the inter-batch delay alone.
struct InstantSummarizer;

#[async_trait]
impl Summarizer for InstantSummarizer {
    async fn summarize(&self, item: &Item, _directives: &Directives) -> Result<String> {
        Ok(format!("summary of {}", item.id))
    }
}

async fn drain_elapsed(item_count: usize, concurrency: usize, delay: Duration) -> Duration {
    let temp = TempDir::new().unwrap();
    let (config, discovery) = fixture(&temp, item_count);
    let store = CheckpointStore::new(config.output_root().unwrap());
    let orch = Orchestrator::new(config, store, discovery, Arc::new(InstantSummarizer));

    orch.reconcile_all(None).await.unwrap();

    let start = tokio::time::Instant::now();
    orch.drain(None, None, concurrency, delay).await.unwrap();
    start.elapsed()
}

#[tokio::test(start_paused = true)]
async fn test_delay_waited_once_between_two_batches() {
    // 3 items at concurrency 2 form two batches, so exactly one pause
    let elapsed = drain_elapsed(3, 2, Duration::from_millis(100)).await;
    assert_eq!(elapsed, Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_delay_skipped_after_the_final_batch() {
    // 2 items at concurrency 2 form a single batch: no pause at all
    let elapsed = drain_elapsed(2, 2, Duration::from_millis(100)).await;
    assert_eq!(elapsed, Duration::ZERO);
}

#[tokio::test]
async fn test_checkpoint_persisted_between_batches() {
    // A summarizer that fails the whole process after the first batch would
    // be hard to arrange; instead drain twice with a limit and verify the
    // first run's progress survived to the second.
    let temp = TempDir::new().unwrap();
    let (config, discovery) = fixture(&temp, 4);
    let summarizer = GaugedSummarizer::new();
    let store = CheckpointStore::new(config.output_root().unwrap());
    let source = config.sources[0].clone();
    let orch = Orchestrator::new(config, store, discovery, summarizer);

    orch.reconcile_all(None).await.unwrap();
    orch.drain(None, Some(2), 2, Duration::ZERO).await.unwrap();

    let cp = orch.store().load(&source).await.unwrap();
    let summarized = cp
        .items
        .values()
        .filter(|r| r.status == ItemStatus::Summarized)
        .count();
    assert_eq!(summarized, 2);

    orch.drain(None, None, 2, Duration::ZERO).await.unwrap();
    let cp = orch.store().load(&source).await.unwrap();
    assert!(cp
        .items
        .values()
        .all(|r| r.status == ItemStatus::Summarized));
}
