//! Discovery via the `yt-dlp` CLI.
//!
//! Uses flat-playlist JSON mode, which lists entries without downloading
//! anything. The result cap is passed to yt-dlp itself (`--playlist-end`),
//! so it bounds raw discovery before any keyword filtering.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::domain::{Item, Source};

use super::Discovery;

/// Discovery adapter shelling out to yt-dlp.
pub struct YtDlpDiscovery {
    binary_path: String,
}

impl YtDlpDiscovery {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

/// Top-level yt-dlp `-J` output for a playlist/channel
#[derive(Debug, Deserialize)]
struct PlaylistDump {
    #[serde(default)]
    entries: Vec<PlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[async_trait]
impl Discovery for YtDlpDiscovery {
    async fn discover(&self, source: &Source, max_results: usize) -> Result<Vec<Item>> {
        let output = Command::new(&self.binary_path)
            .args(["--flat-playlist", "-J"])
            .arg("--playlist-end")
            .arg(max_results.to_string())
            .arg(&source.url)
            .output()
            .await
            .with_context(|| format!("Failed to spawn {} for '{}'", self.binary_path, source.id))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} failed for source '{}' (exit code {}): {}",
                self.binary_path,
                source.id,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let dump: PlaylistDump = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("Failed to parse yt-dlp output for '{}'", source.id))?;

        let items = dump
            .entries
            .into_iter()
            .map(|entry| {
                let url = entry
                    .url
                    .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={}", entry.id));
                Item {
                    id: entry.id,
                    title: entry.title,
                    description: entry.description.unwrap_or_default(),
                    url,
                }
            })
            .collect();

        Ok(items)
    }
}
