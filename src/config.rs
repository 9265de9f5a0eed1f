//! Project configuration.
//!
//! A project is defined by a single YAML file listing sources and settings.
//! The path comes from the CLI and is threaded through explicitly; there is
//! no process-global config state. Validation collects every violated field
//! and fails before any checkpoint is touched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{LengthClass, Source};

/// Project config file schema (matches YAML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used in the combined document title
    pub project: String,

    /// Default keyword filter applied to discovery (empty = keep everything)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Source definitions
    pub sources: Vec<Source>,

    #[serde(default)]
    pub settings: Settings,
}

/// Pipeline settings with sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Per-source cap on raw discovery results
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Target summary length
    #[serde(default)]
    pub length: LengthClass,

    /// Instruction template; `{title}` and `{source}` are substituted
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Root directory for checkpoints and summaries
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Model override passed to the summarization backend
    #[serde(default)]
    pub model: Option<String>,

    /// Path to the discovery binary
    #[serde(default = "default_ytdlp_bin")]
    pub ytdlp_bin: String,

    /// Path to the summarization binary
    #[serde(default = "default_fabric_bin")]
    pub fabric_bin: String,

    /// Per-call timeout for the summarization backend
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_max_results() -> usize {
    25
}

fn default_prompt() -> String {
    "Summarize the video \"{title}\" from {source}.".to_string()
}

fn default_ytdlp_bin() -> String {
    "yt-dlp".to_string()
}

fn default_fabric_bin() -> String {
    "fabric".to_string()
}

fn default_timeout_seconds() -> u64 {
    600
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            length: LengthClass::default(),
            prompt: default_prompt(),
            output_dir: None,
            model: None,
            ytdlp_bin: default_ytdlp_bin(),
            fabric_bin: default_fabric_bin(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ProjectConfig {
    /// Load and validate a project config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the config, reporting every violated field at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.project.trim().is_empty() {
            problems.push("project: name cannot be empty".to_string());
        }

        if self.sources.is_empty() {
            problems.push("sources: at least one source is required".to_string());
        }

        let mut seen_ids = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.id.trim().is_empty() {
                problems.push(format!("sources[{}].id: cannot be empty", i));
            } else {
                if !seen_ids.insert(source.id.as_str()) {
                    problems.push(format!("sources[{}].id: duplicate id '{}'", i, source.id));
                }
                if source
                    .id
                    .chars()
                    .any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
                {
                    problems.push(format!(
                        "sources[{}].id: '{}' may only contain alphanumerics, '-' and '_' \
                         (it names a directory)",
                        i, source.id
                    ));
                }
            }
            if source.name.trim().is_empty() {
                problems.push(format!("sources[{}].name: cannot be empty", i));
            }
            if source.url.trim().is_empty() {
                problems.push(format!("sources[{}].url: cannot be empty", i));
            }
        }

        if self.settings.max_results == 0 {
            problems.push("settings.max_results: must be at least 1".to_string());
        }
        if self.settings.prompt.trim().is_empty() {
            problems.push("settings.prompt: cannot be empty".to_string());
        }
        if self.settings.timeout_seconds == 0 {
            problems.push("settings.timeout_seconds: must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid project config:\n  - {}", problems.join("\n  - "))
        }
    }

    /// Resolve the output root: explicit setting, or `~/.distill/<project>`.
    pub fn output_root(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.settings.output_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".distill").join(&self.project))
    }

    /// Enabled sources, optionally narrowed to one id.
    ///
    /// A filter naming an unknown source is an error (the CLI surfaces it as
    /// a non-zero exit).
    pub fn enabled_sources(&self, filter: Option<&str>) -> Result<Vec<&Source>> {
        if let Some(id) = filter {
            let source = self
                .sources
                .iter()
                .find(|s| s.id == id)
                .with_context(|| format!("Unknown source: {}", id))?;
            return Ok(vec![source]);
        }
        Ok(self.sources.iter().filter(|s| s.enabled).collect())
    }
}
