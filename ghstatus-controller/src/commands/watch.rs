//! Long-running watch over a pipeline-run event stream on stdin

use anyhow::{Context, Result};
use colored::*;
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::build_reconciler;
use crate::config::Config;
use crate::repository::PipelineRunCache;
use crate::scheduler::{Dispatcher, feed};

const EVENT_BUFFER: usize = 256;

/// Dispatch reconciliations until stdin ends or the process is interrupted
pub async fn handle_watch(config: &Config) -> Result<()> {
    let selector = config.selector()?;
    let cache = Arc::new(PipelineRunCache::new());
    let reconciler = Arc::new(build_reconciler(config, Arc::clone(&cache)));
    let dispatcher = Dispatcher::new(
        reconciler,
        cache,
        selector,
        config.max_concurrent_reconciles,
    );

    // A plain thread: a blocked stdin read must not hold up runtime shutdown
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let (done_tx, done_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("watch-feed".to_string())
        .spawn(move || {
            let _ = done_tx.send(feed::pump(io::stdin().lock(), events_tx));
        })
        .context("Failed to start the feed reader")?;

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            interrupt.cancel();
        }
    });

    let stats = dispatcher.run(events_rx, shutdown.clone()).await;

    if !shutdown.is_cancelled() {
        done_rx
            .await
            .context("Feed reader exited unexpectedly")?
            .context("Failed to read the watch feed")?;
    }

    println!(
        "{} {} reconciled, {} failed, {} skipped",
        "Watch finished:".bold(),
        stats.reconciled.to_string().green(),
        stats.failed.to_string().red(),
        stats.skipped.to_string().dimmed()
    );

    Ok(())
}
