//! Commands module
//!
//! Defines the CLI commands and their handlers.

mod reconcile;
mod watch;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use ghstatus_client::ClientOptions;
use ghstatus_core::domain::status::{CommitState, CommitStatus};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::repository::{MountedSecretRepository, PipelineRunCache};
use crate::service::{GithubClientFactory, Reconciler};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Watch pipeline runs on stdin and publish their conditions
    ///
    /// Expects the output of
    /// `kubectl get pipelineruns -A -w -o json --output-watch-events`.
    Watch,
    /// Reconcile the pipeline runs in a JSON file once
    Reconcile {
        /// File holding a pipeline run, a list, or watch events
        file: PathBuf,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Watch => watch::handle_watch(config).await,
        Commands::Reconcile { file } => reconcile::handle_reconcile(&file, config).await,
    }
}

/// Wires a reconciler to GitHub and the mounted secrets
fn build_reconciler(config: &Config, pipeline_runs: Arc<PipelineRunCache>) -> Reconciler {
    let options = ClientOptions {
        insecure_skip_verify: config.insecure_skip_verify,
        timeout: Some(config.http_timeout),
    };

    Reconciler::new(
        pipeline_runs,
        Arc::new(MountedSecretRepository::new(config.secrets_dir.clone())),
        Arc::new(GithubClientFactory::new(options)),
        config,
    )
}

fn colorize_state(state: CommitState) -> ColoredString {
    let state_str = state.to_string();
    match state {
        CommitState::Pending => state_str.yellow(),
        CommitState::Success => state_str.green(),
        CommitState::Failure => state_str.red(),
    }
}

fn print_status(status: &CommitStatus) {
    println!(
        "    {:<8} {} {}",
        colorize_state(status.state),
        status.context.cyan(),
        status.description.dimmed()
    );
}
