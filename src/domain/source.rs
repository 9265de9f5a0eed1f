//! Source and item definitions.
//!
//! Sources come from the project config and are immutable at runtime;
//! the pipeline never writes back to a source definition.

use serde::{Deserialize, Serialize};

/// A configured origin of items (e.g. a channel or playlist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Stable identifier, unique within a project. Used as the storage key
    /// for the source's checkpoint and artifact directory.
    pub id: String,

    /// Human-readable display name
    pub name: String,

    /// Source locator (URL)
    pub url: String,

    /// Kind of source (auto-detected by the discovery tool if omitted)
    #[serde(default)]
    pub kind: Option<SourceKind>,

    /// Whether this source participates in reconcile/drain
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-source keyword override (falls back to the project default)
    #[serde(default)]
    pub keywords: Option<Vec<String>>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Source {
    /// Effective keyword set: the source override, or the project default.
    pub fn effective_keywords<'a>(&'a self, default: &'a [String]) -> &'a [String] {
        self.keywords.as_deref().unwrap_or(default)
    }
}

/// Supported source kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Channel,
    Playlist,
    Feed,
}

/// One unit of work discovered from a source.
///
/// Append-only once discovered: the pipeline never deletes a known item,
/// only updates its checkpoint record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier, unique within its source
    pub id: String,

    /// Item title
    pub title: String,

    /// Free-text description (used for keyword matching only, not persisted
    /// in the checkpoint)
    #[serde(default)]
    pub description: String,

    /// Item locator (URL)
    pub url: String,
}

/// Target summary length, ordered shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthClass {
    Short,
    Medium,
    Long,
    Xl,
    Xxl,
}

impl LengthClass {
    /// Phrase spliced into the summarization instructions.
    pub fn directive(&self) -> &'static str {
        match self {
            LengthClass::Short => "a few sentences",
            LengthClass::Medium => "two or three paragraphs",
            LengthClass::Long => "a detailed multi-section summary",
            LengthClass::Xl => "an in-depth summary with key quotes",
            LengthClass::Xxl => "an exhaustive summary covering every topic discussed",
        }
    }
}

impl Default for LengthClass {
    fn default() -> Self {
        LengthClass::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_class_ordering() {
        assert!(LengthClass::Short < LengthClass::Medium);
        assert!(LengthClass::Medium < LengthClass::Long);
        assert!(LengthClass::Long < LengthClass::Xl);
        assert!(LengthClass::Xl < LengthClass::Xxl);
    }

    #[test]
    fn test_effective_keywords_override() {
        let default = vec!["rust".to_string()];
        let mut source = Source {
            id: "s1".to_string(),
            name: "Source".to_string(),
            url: "https://example.com".to_string(),
            kind: None,
            enabled: true,
            keywords: None,
            tags: Vec::new(),
        };

        assert_eq!(source.effective_keywords(&default), &default[..]);

        source.keywords = Some(vec!["ai".to_string()]);
        assert_eq!(
            source.effective_keywords(&default),
            &["ai".to_string()][..]
        );
    }

    #[test]
    fn test_source_kind_deserializes_snake_case() {
        let kind: SourceKind = serde_yaml::from_str("playlist").unwrap();
        assert_eq!(kind, SourceKind::Playlist);
    }
}
