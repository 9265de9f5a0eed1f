//! Checkpoint state: per-source record of every known item and its status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::{Item, Source};

/// Processing status of one item.
///
/// Transitions: `pending -> summarized` on success, `pending -> error` on
/// failure, `error -> pending` only via an explicit reset. `skipped` is
/// reserved for a future filtering rule; nothing in the pipeline sets it.
/// A record never moves backward from `summarized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Summarized,
    Error,
    Skipped,
}

/// Mutable state of one item within a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub status: ItemStatus,

    /// Title snapshot, kept for display without re-fetching
    pub title: String,

    /// Locator snapshot
    pub url: String,

    /// Failure detail (set when status is `error`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the summary was produced (set when status is `summarized`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summarized_at: Option<DateTime<Utc>>,
}

impl ItemRecord {
    /// Fresh record for a newly discovered item.
    pub fn pending(item: &Item) -> Self {
        Self {
            status: ItemStatus::Pending,
            title: item.title.clone(),
            url: item.url.clone(),
            error: None,
            summarized_at: None,
        }
    }

    /// Mark summarization success. Clears any previous error.
    pub fn mark_summarized(&mut self, at: DateTime<Utc>) {
        self.status = ItemStatus::Summarized;
        self.summarized_at = Some(at);
        self.error = None;
    }

    /// Mark summarization failure. Never demotes a summarized record.
    pub fn mark_error(&mut self, detail: impl Into<String>) {
        if self.status == ItemStatus::Summarized {
            return;
        }
        self.status = ItemStatus::Error;
        self.error = Some(detail.into());
    }
}

/// Full persisted state for one source.
///
/// Items are keyed by item id in a `BTreeMap`, so stored iteration order is
/// lexicographic by id and stable across load/save cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Owning source id
    pub source_id: String,

    /// Source name snapshot at last reconcile
    pub source_name: String,

    /// Source locator snapshot at last reconcile
    pub source_url: String,

    /// When reconcile last ran for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled_at: Option<DateTime<Utc>>,

    /// All known items, keyed by item id
    #[serde(default)]
    pub items: BTreeMap<String, ItemRecord>,
}

impl Checkpoint {
    /// Create an empty checkpoint for a source.
    pub fn new(source: &Source) -> Self {
        Self {
            version: 1,
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            source_url: source.url.clone(),
            last_reconciled_at: None,
            items: BTreeMap::new(),
        }
    }

    /// Merge newly discovered items, inserting `pending` records for unknown
    /// ids. Known items are left untouched regardless of upstream title or
    /// URL changes. Returns the number of records added.
    pub fn merge_discovered(&mut self, items: &[Item]) -> usize {
        let mut added = 0;
        for item in items {
            if !self.items.contains_key(&item.id) {
                self.items.insert(item.id.clone(), ItemRecord::pending(item));
                added += 1;
            }
        }
        added
    }

    /// Pending items in stored iteration order, capped at `limit`.
    pub fn pending_items(&self, limit: usize) -> Vec<Item> {
        self.items
            .iter()
            .filter(|(_, rec)| rec.status == ItemStatus::Pending)
            .take(limit)
            .map(|(id, rec)| Item {
                id: id.clone(),
                title: rec.title.clone(),
                description: String::new(),
                url: rec.url.clone(),
            })
            .collect()
    }

    /// Reset all `error` records back to `pending`. Returns the count reset.
    pub fn reset_errors(&mut self) -> usize {
        let mut reset = 0;
        for rec in self.items.values_mut() {
            if rec.status == ItemStatus::Error {
                rec.status = ItemStatus::Pending;
                rec.error = None;
                reset += 1;
            }
        }
        reset
    }

    /// Per-status counts for reporting.
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for rec in self.items.values() {
            match rec.status {
                ItemStatus::Pending => counts.pending += 1,
                ItemStatus::Summarized => counts.summarized += 1,
                ItemStatus::Error => counts.error += 1,
                ItemStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

/// Per-status item counts for one checkpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub summarized: usize,
    pub error: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.summarized + self.error + self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> Source {
        Source {
            id: "s1".to_string(),
            name: "Source One".to_string(),
            url: "https://example.com/s1".to_string(),
            kind: None,
            enabled: true,
            keywords: None,
            tags: Vec::new(),
        }
    }

    fn test_item(id: &str, title: &str) -> Item {
        Item {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            url: format!("https://example.com/watch/{}", id),
        }
    }

    #[test]
    fn test_merge_adds_only_unknown_items() {
        let mut cp = Checkpoint::new(&test_source());

        let added = cp.merge_discovered(&[test_item("v1", "First"), test_item("v2", "Second")]);
        assert_eq!(added, 2);

        // Re-merge with a changed title: known record untouched
        let added = cp.merge_discovered(&[test_item("v1", "Renamed"), test_item("v3", "Third")]);
        assert_eq!(added, 1);
        assert_eq!(cp.items["v1"].title, "First");
        assert_eq!(cp.items.len(), 3);
    }

    #[test]
    fn test_merge_never_touches_summarized_records() {
        let mut cp = Checkpoint::new(&test_source());
        cp.merge_discovered(&[test_item("v1", "First")]);
        cp.items
            .get_mut("v1")
            .unwrap()
            .mark_summarized(Utc::now());

        cp.merge_discovered(&[test_item("v1", "First")]);
        assert_eq!(cp.items["v1"].status, ItemStatus::Summarized);
    }

    #[test]
    fn test_pending_items_order_and_limit() {
        let mut cp = Checkpoint::new(&test_source());
        cp.merge_discovered(&[
            test_item("c", "C"),
            test_item("a", "A"),
            test_item("b", "B"),
        ]);
        cp.items.get_mut("b").unwrap().mark_summarized(Utc::now());

        let pending = cp.pending_items(usize::MAX);
        let ids: Vec<&str> = pending.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);

        let limited = cp.pending_items(1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, "a");
    }

    #[test]
    fn test_mark_error_never_demotes_summarized() {
        let mut rec = ItemRecord::pending(&test_item("v1", "First"));
        rec.mark_summarized(Utc::now());
        rec.mark_error("late failure");

        assert_eq!(rec.status, ItemStatus::Summarized);
        assert!(rec.error.is_none());
    }

    #[test]
    fn test_reset_errors_only_touches_error_records() {
        let mut cp = Checkpoint::new(&test_source());
        cp.merge_discovered(&[
            test_item("a", "A"),
            test_item("b", "B"),
            test_item("c", "C"),
        ]);
        cp.items.get_mut("a").unwrap().mark_error("boom");
        cp.items.get_mut("b").unwrap().mark_summarized(Utc::now());

        let reset = cp.reset_errors();
        assert_eq!(reset, 1);
        assert_eq!(cp.items["a"].status, ItemStatus::Pending);
        assert!(cp.items["a"].error.is_none());
        assert_eq!(cp.items["b"].status, ItemStatus::Summarized);
        assert_eq!(cp.items["c"].status, ItemStatus::Pending);
    }

    #[test]
    fn test_counts() {
        let mut cp = Checkpoint::new(&test_source());
        cp.merge_discovered(&[test_item("a", "A"), test_item("b", "B")]);
        cp.items.get_mut("a").unwrap().mark_summarized(Utc::now());

        let counts = cp.counts();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.summarized, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_checkpoint_round_trips_through_json() {
        let mut cp = Checkpoint::new(&test_source());
        cp.merge_discovered(&[test_item("a", "A")]);
        cp.items.get_mut("a").unwrap().mark_error("failed: no transcript");
        cp.last_reconciled_at = Some(Utc::now());

        let json = serde_json::to_string_pretty(&cp).unwrap();
        let back: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.source_id, cp.source_id);
        assert_eq!(back.items, cp.items);
    }
}
