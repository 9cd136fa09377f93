//! ghstatus
//!
//! Mirrors the conditions of Tekton pipeline runs onto the built commit as
//! GitHub commit statuses.
//!
//! Architecture:
//! - Configuration: Load settings from environment, overridable by flags
//! - Repositories: Cached pipeline-run snapshots and mounted secrets
//! - Services: Annotation settings, revision lookup, reconciliation
//! - Scheduler: Watch feed decoding, event filtering and dispatch
//! - Commands: `watch` for the long-running controller, `reconcile` for one-shot use

mod commands;
mod config;
mod error;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Commands, handle_command};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "ghstatus")]
#[command(about = "Publish Tekton PipelineRun conditions as GitHub commit statuses", long_about = None)]
struct Cli {
    /// Root of mounted secrets, laid out as <root>/<namespace>/<secret>/<key>
    #[arg(long, env = "GHSTATUS_SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,

    /// Skip TLS certificate validation on GitHub calls
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Only reconcile pipeline runs carrying these labels (e.g. "app=ci,team=web")
    #[arg(long, env = "GHSTATUS_LABEL_SELECTOR")]
    selector: Option<String>,

    /// Upper bound on reconciliations running at once
    #[arg(long, env = "GHSTATUS_MAX_CONCURRENT_RECONCILES")]
    max_concurrent: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghstatus=info,ghstatus_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = load_config(&cli)?;
    info!(
        "Loaded configuration: secrets_dir={}, context={}, selector={}",
        config.secrets_dir.display(),
        config.status_context,
        config.label_selector
    );

    handle_command(cli.command, &config).await
}

/// Loads configuration from environment variables, then applies CLI flags
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid configuration in environment")?;

    if let Some(secrets_dir) = &cli.secrets_dir {
        config.secrets_dir = secrets_dir.clone();
    }
    if cli.insecure_skip_verify {
        config.insecure_skip_verify = true;
    }
    if let Some(selector) = &cli.selector {
        config.label_selector = selector.clone();
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent_reconciles = max_concurrent;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "ghstatus",
            "--selector",
            "team=web",
            "--max-concurrent",
            "8",
            "--insecure-skip-verify",
            "watch",
        ])
        .unwrap();

        assert_eq!(cli.selector.as_deref(), Some("team=web"));
        assert_eq!(cli.max_concurrent, Some(8));
        assert!(cli.insecure_skip_verify);
        assert!(matches!(cli.command, Commands::Watch));
    }
}
