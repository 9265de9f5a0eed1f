//! Combine all persisted summaries into one document.
//!
//! Pure read-and-render: artifacts are grouped by source id, ordered by
//! filename within a source, headers stripped, and the result is preceded
//! by a generated table of contents. No state mutation; the same artifact
//! set always renders byte-identically.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

use crate::core::summarize::split_header;
use crate::store::CheckpointStore;

/// One artifact selected for combination.
#[derive(Debug, Clone)]
struct CombineEntry {
    source_id: String,
    file_name: String,
    title: String,
    body: String,
}

/// Render the combined document for every artifact under the store root.
pub async fn combine(store: &CheckpointStore, project: &str) -> Result<String> {
    let entries = collect_entries(store.root()).await?;

    let mut doc = String::new();
    doc.push_str(&format!("# {} — combined summaries\n\n", project));

    doc.push_str("## Contents\n\n");
    for entry in &entries {
        doc.push_str(&format!("- [{}] {}\n", entry.source_id, entry.title));
    }
    doc.push('\n');

    let mut current_source: Option<&str> = None;
    for entry in &entries {
        if current_source != Some(entry.source_id.as_str()) {
            doc.push_str(&format!("## {}\n\n", entry.source_id));
            current_source = Some(&entry.source_id);
        }
        doc.push_str(&format!("### {}\n\n", entry.title));
        doc.push_str(entry.body.trim_end());
        doc.push_str("\n\n");
    }

    Ok(doc)
}

/// Gather artifacts, sorted by source id then filename.
async fn collect_entries(root: &Path) -> Result<Vec<CombineEntry>> {
    let mut entries = Vec::new();

    if !root.exists() {
        return Ok(entries);
    }

    let mut source_dirs = Vec::new();
    let mut read_dir = fs::read_dir(root)
        .await
        .with_context(|| format!("Failed to read {}", root.display()))?;
    while let Some(dir_entry) = read_dir.next_entry().await? {
        if dir_entry.file_type().await?.is_dir() {
            source_dirs.push(dir_entry.file_name().to_string_lossy().to_string());
        }
    }
    source_dirs.sort();

    for source_id in source_dirs {
        let summaries = root.join(&source_id).join("summaries");
        if !summaries.exists() {
            continue;
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(&summaries).await?;
        while let Some(file_entry) = read_dir.next_entry().await? {
            let name = file_entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".md") {
                files.push(name);
            }
        }
        files.sort();

        for file_name in files {
            let path = summaries.join(&file_name);
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let (fields, body) = split_header(&content);
            let title = fields
                .iter()
                .find(|(k, _)| k == "title")
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| file_name.trim_end_matches(".md").to_string());

            debug!(source = %source_id, file = %file_name, "Adding artifact to combined document");
            entries.push(CombineEntry {
                source_id: source_id.clone(),
                file_name,
                title,
                body: body.to_string(),
            });
        }
    }

    // read_dir order is platform-dependent; the sort above is what makes
    // combine deterministic
    entries.sort_by(|a, b| {
        (a.source_id.as_str(), a.file_name.as_str()).cmp(&(b.source_id.as_str(), b.file_name.as_str()))
    });

    Ok(entries)
}
