//! One-shot reconciliation of pipeline runs read from a file

use anyhow::{Context, Result};
use colored::*;
use ghstatus_core::domain::pipeline_run::PipelineRun;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::{build_reconciler, print_status};
use crate::config::Config;
use crate::repository::PipelineRunCache;
use crate::scheduler::{WatchEvent, feed};
use crate::service::ReconcileOutcome;

/// Reconcile every applied pipeline run in `file`
///
/// The label selector is not applied: naming the file is the opt-in.
pub async fn handle_reconcile(file: &Path, config: &Config) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let runs: Vec<PipelineRun> = feed::decode(document)
        .with_context(|| format!("{} does not hold pipeline runs", file.display()))?
        .into_iter()
        .filter_map(|event| match event {
            WatchEvent::Applied(run) => Some(run),
            WatchEvent::Deleted(_) => None,
        })
        .collect();

    if runs.is_empty() {
        println!("{}", "No pipeline runs found.".yellow());
        return Ok(());
    }

    let cache = Arc::new(PipelineRunCache::new());
    let reconciler = build_reconciler(config, Arc::clone(&cache));
    let mut failures = 0;

    for run in runs {
        let key = run.key();
        cache.upsert(run).await;

        match reconciler.reconcile(&key).await {
            Ok(ReconcileOutcome::Published(statuses)) => {
                println!("  {} {}", "✓".green(), key.to_string().bold());
                if statuses.is_empty() {
                    println!("    {}", "no conditions yet".dimmed());
                }
                for status in &statuses {
                    print_status(status);
                }
            }
            Ok(ReconcileOutcome::Gone) => {
                println!("  {} {} {}", "-".dimmed(), key, "gone".dimmed());
            }
            Err(e) => {
                failures += 1;
                println!("  {} {}", "✗".red(), key.to_string().bold());
                println!("    {}", e.to_string().red());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} pipeline run(s) failed to reconcile", failures);
    }

    Ok(())
}
