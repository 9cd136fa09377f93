//! Reconciler
//!
//! Mirrors the conditions of one pipeline run onto its commit as GitHub
//! statuses. A reconciliation is a function of the current snapshot only:
//! nothing is remembered between runs, and redelivering the same snapshot
//! publishes the same statuses again.

use ghstatus_client::{Credentials, StatusTarget};
use ghstatus_core::domain::pipeline_run::ObjectKey;
use ghstatus_core::domain::status::CommitStatus;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ReconcileError, Result};
use crate::repository::{PipelineRunRepository, SecretRepository};
use crate::service::StatusClientFactory;
use crate::service::revision::{self, RevisionDescriptor};
use crate::service::settings::StatusSettings;

/// What a successful reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The pipeline run no longer exists
    Gone,
    /// Statuses published, in condition order
    Published(Vec<CommitStatus>),
}

pub struct Reconciler {
    pipeline_runs: Arc<dyn PipelineRunRepository>,
    secrets: Arc<dyn SecretRepository>,
    clients: Arc<dyn StatusClientFactory>,
    status_context: String,
    target_url: String,
}

impl Reconciler {
    pub fn new(
        pipeline_runs: Arc<dyn PipelineRunRepository>,
        secrets: Arc<dyn SecretRepository>,
        clients: Arc<dyn StatusClientFactory>,
        config: &Config,
    ) -> Self {
        Self {
            pipeline_runs,
            secrets,
            clients,
            status_context: config.status_context.clone(),
            target_url: config.target_url.clone(),
        }
    }

    /// Reconcile the pipeline run identified by `key`
    ///
    /// Stops at the first failing step; a failed publish leaves the remaining
    /// conditions unpublished.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<ReconcileOutcome> {
        let Some(run) = self
            .pipeline_runs
            .get(key)
            .await
            .map_err(|e| ReconcileError::Remote(format!("Failed to read {}: {:#}", key, e)))?
        else {
            debug!("Pipeline run {} is gone, nothing to do", key);
            return Ok(ReconcileOutcome::Gone);
        };

        let settings = StatusSettings::from_pipeline_run(&run)?;
        let credentials = self.credentials(key, &settings).await?;

        let descriptor: RevisionDescriptor = settings.revision_param.parse()?;
        let revision = revision::locate(run.tasks(), &descriptor)?;

        let target = StatusTarget {
            base_url: settings.base_url,
            owner: settings.owner,
            repo: settings.repository,
            revision: revision.to_string(),
        };
        let publisher = self.clients.connect(target, credentials).await?;

        let mut published = Vec::with_capacity(run.conditions().len());
        for condition in run.conditions() {
            let status =
                CommitStatus::for_condition(condition.status, &self.status_context, &self.target_url);
            debug!(
                "Condition {}={} of {} maps to '{}'",
                condition.condition_type, condition.status, key, status.state
            );
            publisher.publish(&status).await?;
            published.push(status);
        }

        info!(
            "Reconciled {}: published {} status(es) for revision {}",
            key,
            published.len(),
            revision
        );

        Ok(ReconcileOutcome::Published(published))
    }

    /// Read the configured secret entry and wrap it as credentials
    async fn credentials(&self, key: &ObjectKey, settings: &StatusSettings) -> Result<Credentials> {
        let secret = self
            .secrets
            .get(&key.namespace, &settings.secret_name)
            .await
            .map_err(|e| {
                ReconcileError::Remote(format!(
                    "Failed to read secret '{}': {:#}",
                    settings.secret_name, e
                ))
            })?
            .ok_or_else(|| {
                ReconcileError::Remote(format!(
                    "secret '{}' not found in namespace '{}'",
                    settings.secret_name, key.namespace
                ))
            })?;

        let not_set = || {
            ReconcileError::Config(format!(
                "'{}' is not set in the secret '{}'",
                settings.secret_key, settings.secret_name
            ))
        };

        let value = secret.non_empty(&settings.secret_key).ok_or_else(not_set)?;
        let value = std::str::from_utf8(value)
            .map_err(|_| {
                ReconcileError::Config(format!(
                    "'{}' in the secret '{}' is not valid UTF-8",
                    settings.secret_key, settings.secret_name
                ))
            })?
            .trim();
        if value.is_empty() {
            return Err(not_set());
        }

        Ok(match settings.app {
            Some(app) => Credentials::app(app.app_id, app.installation_id, value),
            None => Credentials::token(value),
        })
    }
}
