//! Pipeline-run repository
//!
//! Holds the latest snapshot of every pipeline run seen on the watch feed.
//! Reconciliations read from here instead of the event that triggered them,
//! so a run always reconciles against its newest state.

use anyhow::Result;
use async_trait::async_trait;
use ghstatus_core::domain::pipeline_run::{ObjectKey, PipelineRun};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Repository trait for reading pipeline runs
#[async_trait]
pub trait PipelineRunRepository: Send + Sync {
    /// Fetches a pipeline run by identity
    ///
    /// Returns `None` when the run does not exist (e.g. it was deleted).
    async fn get(&self, key: &ObjectKey) -> Result<Option<PipelineRun>>;
}

/// In-memory snapshot cache fed by the watch feed
#[derive(Default)]
pub struct PipelineRunCache {
    runs: RwLock<HashMap<ObjectKey, PipelineRun>>,
}

impl PipelineRunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the newest snapshot of a run, returning the one it replaces
    pub async fn upsert(&self, run: PipelineRun) -> Option<PipelineRun> {
        self.runs.write().await.insert(run.key(), run)
    }

    pub async fn remove(&self, key: &ObjectKey) -> Option<PipelineRun> {
        self.runs.write().await.remove(key)
    }

    pub async fn len(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait]
impl PipelineRunRepository for PipelineRunCache {
    async fn get(&self, key: &ObjectKey) -> Result<Option<PipelineRun>> {
        Ok(self.runs.read().await.get(key).cloned())
    }
}
