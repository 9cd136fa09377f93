//! Controller configuration
//!
//! Defines the tunables of the controller: where mounted secrets live, how
//! published statuses are labelled, and how the watch feed is filtered.

use std::path::PathBuf;
use std::time::Duration;

use crate::scheduler::LabelSelector;

/// Controller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of mounted secrets, laid out as `<root>/<namespace>/<secret>/<key>`
    pub secrets_dir: PathBuf,

    /// Skip TLS certificate validation on GitHub calls
    pub insecure_skip_verify: bool,

    /// Context label of every published status
    pub status_context: String,

    /// Link attached to every published status
    pub target_url: String,

    /// Upper bound on reconciliations running at once
    pub max_concurrent_reconciles: usize,

    /// Only pipeline runs carrying these labels are reconciled (e.g. "app=ci,team=web")
    pub label_selector: String,

    /// Timeout of a single GitHub HTTP call
    pub http_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - GHSTATUS_SECRETS_DIR (default: /var/run/ghstatus/secrets)
    /// - GHSTATUS_INSECURE_SKIP_VERIFY (default: false)
    /// - GHSTATUS_STATUS_CONTEXT (default: tekton-ci)
    /// - GHSTATUS_TARGET_URL (default: https://rancher.jquad.rocks)
    /// - GHSTATUS_MAX_CONCURRENT_RECONCILES (default: 4)
    /// - GHSTATUS_LABEL_SELECTOR (default: github-status-controller=enabled)
    /// - GHSTATUS_HTTP_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let insecure_skip_verify = match lookup("GHSTATUS_INSECURE_SKIP_VERIFY") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                anyhow::anyhow!("GHSTATUS_INSECURE_SKIP_VERIFY must be true or false, got '{}'", value)
            })?,
            None => defaults.insecure_skip_verify,
        };

        let max_concurrent_reconciles = match lookup("GHSTATUS_MAX_CONCURRENT_RECONCILES") {
            Some(value) => value.parse::<usize>().map_err(|_| {
                anyhow::anyhow!("GHSTATUS_MAX_CONCURRENT_RECONCILES must be a number, got '{}'", value)
            })?,
            None => defaults.max_concurrent_reconciles,
        };

        let http_timeout = match lookup("GHSTATUS_HTTP_TIMEOUT") {
            Some(value) => value.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                anyhow::anyhow!("GHSTATUS_HTTP_TIMEOUT must be a number of seconds, got '{}'", value)
            })?,
            None => defaults.http_timeout,
        };

        Ok(Self {
            secrets_dir: lookup("GHSTATUS_SECRETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_dir),
            insecure_skip_verify,
            status_context: lookup("GHSTATUS_STATUS_CONTEXT").unwrap_or(defaults.status_context),
            target_url: lookup("GHSTATUS_TARGET_URL").unwrap_or(defaults.target_url),
            max_concurrent_reconciles,
            label_selector: lookup("GHSTATUS_LABEL_SELECTOR").unwrap_or(defaults.label_selector),
            http_timeout,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.status_context.trim().is_empty() {
            anyhow::bail!("status_context cannot be empty");
        }

        if !self.target_url.starts_with("http://") && !self.target_url.starts_with("https://") {
            anyhow::bail!("target_url must start with http:// or https://");
        }

        if self.max_concurrent_reconciles == 0 {
            anyhow::bail!("max_concurrent_reconciles must be greater than 0");
        }

        if self.http_timeout.as_secs() == 0 {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        self.selector()?;

        Ok(())
    }

    /// Parsed label selector of the watch feed
    pub fn selector(&self) -> anyhow::Result<LabelSelector> {
        self.label_selector.parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secrets_dir: PathBuf::from("/var/run/ghstatus/secrets"),
            insecure_skip_verify: false,
            status_context: "tekton-ci".to_string(),
            target_url: "https://rancher.jquad.rocks".to_string(),
            max_concurrent_reconciles: 4,
            label_selector: "github-status-controller=enabled".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}
