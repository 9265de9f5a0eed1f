//! Command-line interface for distill.
//!
//! Commands map onto the pipeline operations: `reconcile-all` scans sources
//! for new items, `drain` summarizes pending items, `combine` renders one
//! document from all summaries, plus `status`, `list`, and `reset`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{FabricSummarizer, YtDlpDiscovery};
use crate::config::ProjectConfig;
use crate::core::{combine, Orchestrator};
use crate::domain::ItemStatus;
use crate::store::CheckpointStore;

/// distill - checkpointed batch summarization of content sources
#[derive(Parser, Debug)]
#[command(name = "distill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project config file
    #[arg(short, long, global = true, default_value = "distill.yaml", env = "DISTILL_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover new items for every enabled source and record them as pending
    ReconcileAll {
        /// Only reconcile this source
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Summarize pending items
    Drain {
        /// Only drain this source
        #[arg(short, long)]
        source: Option<String>,

        /// Cap on items attempted across all sources
        #[arg(short, long)]
        limit: Option<usize>,

        /// Items summarized concurrently per batch
        #[arg(long, default_value = "2")]
        concurrency: usize,

        /// Pause between batches, in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
    },

    /// Render every summary into one combined document
    Combine {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show per-source item counts
    Status {
        /// Only show this source
        #[arg(short, long)]
        source: Option<String>,
    },

    /// List known items and their statuses
    List {
        /// Only list this source
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum items to show per source
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Reset checkpoint state
    Reset {
        /// Source to reset (all enabled sources if omitted)
        source: Option<String>,

        /// Only flip errored items back to pending, keeping everything else
        #[arg(long)]
        errors: bool,
    },
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let config = ProjectConfig::load(&self.config)?;
        let store = CheckpointStore::new(config.output_root()?);
        let discovery = Arc::new(YtDlpDiscovery::new(config.settings.ytdlp_bin.clone()));
        let summarizer = Arc::new(FabricSummarizer::new(config.settings.fabric_bin.clone()));
        let orchestrator = Orchestrator::new(config, store, discovery, summarizer);

        match self.command {
            Commands::ReconcileAll { source } => {
                reconcile_all(&orchestrator, source.as_deref()).await
            }
            Commands::Drain {
                source,
                limit,
                concurrency,
                delay_ms,
            } => {
                drain(
                    &orchestrator,
                    source.as_deref(),
                    limit,
                    concurrency,
                    Duration::from_millis(delay_ms),
                )
                .await
            }
            Commands::Combine { output } => combine_command(&orchestrator, output).await,
            Commands::Status { source } => status(&orchestrator, source.as_deref()).await,
            Commands::List { source, limit } => list(&orchestrator, source.as_deref(), limit).await,
            Commands::Reset { source, errors } => {
                reset(&orchestrator, source.as_deref(), errors).await
            }
        }
    }
}

async fn reconcile_all(orchestrator: &Orchestrator, source: Option<&str>) -> Result<()> {
    let reports = orchestrator.reconcile_all(source).await?;

    let mut total_added = 0;
    for report in &reports {
        println!(
            "{:<20} discovered {:>3}, added {:>3} (known: {})",
            report.source_id, report.discovered, report.added, report.total_known
        );
        total_added += report.added;
    }
    println!("\n{} new item(s) across {} source(s)", total_added, reports.len());

    Ok(())
}

async fn drain(
    orchestrator: &Orchestrator,
    source: Option<&str>,
    limit: Option<usize>,
    concurrency: usize,
    delay: Duration,
) -> Result<()> {
    let reports = orchestrator.drain(source, limit, concurrency, delay).await?;

    if reports.is_empty() {
        println!("Nothing pending.");
        return Ok(());
    }

    let (mut attempted, mut succeeded, mut failed) = (0, 0, 0);
    for report in &reports {
        println!(
            "{:<20} attempted {:>3}: {} summarized, {} failed",
            report.source_id, report.attempted, report.succeeded, report.failed
        );
        attempted += report.attempted;
        succeeded += report.succeeded;
        failed += report.failed;
    }
    println!(
        "\nTotal: {} attempted, {} summarized, {} failed",
        attempted, succeeded, failed
    );
    if failed > 0 {
        println!("Failed items keep their error detail; see 'list' or reset with 'reset --errors'.");
    }

    Ok(())
}

async fn combine_command(orchestrator: &Orchestrator, output: Option<PathBuf>) -> Result<()> {
    let doc = combine(orchestrator.store(), &orchestrator.config().project).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &doc)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote combined document to {}", path.display());
        }
        None => print!("{}", doc),
    }

    Ok(())
}

async fn status(orchestrator: &Orchestrator, source: Option<&str>) -> Result<()> {
    let statuses = orchestrator.status(source).await?;

    println!(
        "{:<20} {:>8} {:>11} {:>6} {:>8}  last reconciled",
        "source", "pending", "summarized", "error", "skipped"
    );
    for s in &statuses {
        let reconciled = s
            .last_reconciled_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<20} {:>8} {:>11} {:>6} {:>8}  {}",
            s.source_id,
            s.counts.pending,
            s.counts.summarized,
            s.counts.error,
            s.counts.skipped,
            reconciled
        );
    }

    Ok(())
}

async fn list(orchestrator: &Orchestrator, source: Option<&str>, limit: usize) -> Result<()> {
    let config = orchestrator.config();
    let sources = config.enabled_sources(source)?;

    for src in sources {
        let checkpoint = orchestrator.store().load(src).await?;
        println!("{} ({} items)", src.id, checkpoint.items.len());

        for (id, record) in checkpoint.items.iter().take(limit) {
            let marker = match record.status {
                ItemStatus::Pending => " ",
                ItemStatus::Summarized => "x",
                ItemStatus::Error => "!",
                ItemStatus::Skipped => "-",
            };
            println!("  [{}] {} {}", marker, id, record.title);
            if let Some(ref error) = record.error {
                println!("      error: {}", crate::core::summarize::display_detail(error));
            }
        }
        if checkpoint.items.len() > limit {
            println!("  ... and {} more", checkpoint.items.len() - limit);
        }
    }

    Ok(())
}

async fn reset(orchestrator: &Orchestrator, source: Option<&str>, errors_only: bool) -> Result<()> {
    let affected = orchestrator.reset(source, errors_only).await?;

    if errors_only {
        println!("Reset {} errored item(s) to pending", affected);
    } else {
        println!("Cleared {} item record(s)", affected);
    }

    Ok(())
}
