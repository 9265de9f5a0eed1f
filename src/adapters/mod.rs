//! Adapter interfaces for the external discovery and summarization tools.
//!
//! Both externals are subprocesses; everything behind these traits is
//! opaque to the pipeline, which only sees items in and summary text out.

pub mod fabric;
pub mod ytdlp;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Item, LengthClass, Source};

pub use fabric::FabricSummarizer;
pub use ytdlp::YtDlpDiscovery;

/// Directives for one summarization call.
#[derive(Debug, Clone)]
pub struct Directives {
    /// Rendered instruction text (placeholders already substituted)
    pub instructions: String,

    /// Target summary length
    pub length: LengthClass,

    /// Model override, if any
    pub model: Option<String>,

    /// Per-call timeout
    pub timeout: Duration,
}

/// Discovery service: list candidate items for a source.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn discover(&self, source: &Source, max_results: usize) -> Result<Vec<Item>>;
}

/// Summarization service: produce summary text for one item, or fail.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, item: &Item, directives: &Directives) -> Result<String>;
}

/// True if the item's title or description contains any keyword,
/// case-insensitively. An empty keyword set matches everything.
pub fn matches_keywords(item: &Item, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let title = item.title.to_lowercase();
    let description = item.description.to_lowercase();
    keywords.iter().any(|kw| {
        let kw = kw.to_lowercase();
        title.contains(&kw) || description.contains(&kw)
    })
}

/// Discover items for a source and apply keyword filtering.
///
/// The result cap bounds the raw discovery call; filtering happens after, so
/// a capped source can yield fewer than `max_results` filtered items. A
/// discovery failure degrades to zero items for this source rather than
/// aborting the caller's loop over sources.
pub async fn discover_filtered(
    service: &dyn Discovery,
    source: &Source,
    keywords: &[String],
    max_results: usize,
) -> Vec<Item> {
    let discovered = match service.discover(source, max_results).await {
        Ok(items) => items,
        Err(e) => {
            warn!(source = %source.id, error = %e, "Discovery failed, skipping source");
            return Vec::new();
        }
    };

    discovered
        .into_iter()
        .filter(|item| matches_keywords(item, keywords))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, description: &str) -> Item {
        Item {
            id: "x".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            url: "https://example.com/x".to_string(),
        }
    }

    #[test]
    fn test_empty_keywords_match_everything() {
        assert!(matches_keywords(&item("anything", ""), &[]));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let keywords = vec!["react".to_string()];
        assert!(matches_keywords(&item("A React talk", ""), &keywords));
        assert!(matches_keywords(&item("REACTIVE patterns", ""), &keywords));
        assert!(!matches_keywords(&item("unrelated video", ""), &keywords));
    }

    #[test]
    fn test_keyword_or_semantics() {
        let keywords = vec!["rust".to_string(), "go".to_string()];
        assert!(matches_keywords(&item("Rust in prod", ""), &keywords));
        assert!(matches_keywords(&item("Going with Go", ""), &keywords));
        assert!(!matches_keywords(&item("Python tips", ""), &keywords));
    }

    #[test]
    fn test_description_counts_for_matching() {
        let keywords = vec!["wasm".to_string()];
        assert!(matches_keywords(
            &item("Episode 12", "all about WASM runtimes"),
            &keywords
        ));
    }

    struct FailingDiscovery;

    #[async_trait]
    impl Discovery for FailingDiscovery {
        async fn discover(&self, _source: &Source, _max: usize) -> Result<Vec<Item>> {
            anyhow::bail!("network down")
        }
    }

    #[tokio::test]
    async fn test_discovery_failure_degrades_to_empty() {
        let source = Source {
            id: "s1".to_string(),
            name: "S1".to_string(),
            url: "https://example.com".to_string(),
            kind: None,
            enabled: true,
            keywords: None,
            tags: Vec::new(),
        };

        let items = discover_filtered(&FailingDiscovery, &source, &[], 10).await;
        assert!(items.is_empty());
    }
}
