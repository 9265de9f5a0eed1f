//! Summarization via the `fabric` CLI.
//!
//! Subprocess mode: the item URL goes through `-y` (fabric fetches the
//! transcript itself), the rendered instructions are piped to stdin, and
//! stdout is the summary. Each call is bounded by the configured timeout.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::domain::Item;

use super::{Directives, Summarizer};

/// Summarization adapter shelling out to fabric.
pub struct FabricSummarizer {
    binary_path: String,
}

impl FabricSummarizer {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl Summarizer for FabricSummarizer {
    async fn summarize(&self, item: &Item, directives: &Directives) -> Result<String> {
        let mut command = Command::new(&self.binary_path);
        command.args(["-y", &item.url]);
        if let Some(ref model) = directives.model {
            command.args(["-m", model]);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {} for item '{}'", self.binary_path, item.id))?;

        // Instructions plus the length directive form the prompt on stdin
        let prompt = format!(
            "{}\nWrite {}.",
            directives.instructions,
            directives.length.directive()
        );
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .context("Failed to write prompt to fabric stdin")?;
            // Drop stdin to signal EOF
        }

        let output = timeout(directives.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Summarization of '{}' timed out after {:?}",
                    item.id, directives.timeout
                )
            })?
            .with_context(|| format!("Failed to wait for fabric process for item '{}'", item.id))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "fabric failed for item '{}' (exit code {}): {}",
                item.id,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        let stdout =
            String::from_utf8(output.stdout).context("fabric output is not valid UTF-8")?;

        let summary = stdout.trim();
        if summary.is_empty() {
            anyhow::bail!("fabric returned an empty summary for item '{}'", item.id);
        }

        Ok(summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_binary_path() {
        let adapter = FabricSummarizer::new("/custom/path/fabric");
        assert_eq!(adapter.binary_path, "/custom/path/fabric");
    }
}
