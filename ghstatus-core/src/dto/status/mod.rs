//! Commit status DTOs

use serde::{Deserialize, Serialize};

use crate::domain::status::{CommitState, CommitStatus};

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatus {
    pub state: CommitState,
    pub description: String,
    pub context: String,
    pub target_url: String,
}

impl From<&CommitStatus> for CreateStatus {
    fn from(status: &CommitStatus) -> Self {
        Self {
            state: status.state,
            description: status.description.clone(),
            context: status.context.clone(),
            target_url: status.target_url.clone(),
        }
    }
}
