//! Commit status domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::pipeline_run::ConditionStatus;

/// State of a commit status on GitHub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    Pending,
    Success,
    Failure,
}

impl CommitState {
    /// Human description published alongside the state
    pub fn description(&self) -> &'static str {
        match self {
            CommitState::Pending => "The build is currently running",
            CommitState::Success => "The build is successful",
            CommitState::Failure => "The build has failed",
        }
    }
}

impl From<ConditionStatus> for CommitState {
    fn from(status: ConditionStatus) -> Self {
        match status {
            ConditionStatus::True => CommitState::Success,
            ConditionStatus::False => CommitState::Failure,
            ConditionStatus::Unknown => CommitState::Pending,
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitState::Pending => write!(f, "pending"),
            CommitState::Success => write!(f, "success"),
            CommitState::Failure => write!(f, "failure"),
        }
    }
}

/// A commit status as published to GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    pub state: CommitState,
    pub description: String,
    /// Label distinguishing this status from other CI integrations
    pub context: String,
    pub target_url: String,
}

impl CommitStatus {
    /// Build the status published for one condition of a pipeline run
    pub fn for_condition(
        status: ConditionStatus,
        context: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        let state = CommitState::from(status);
        Self {
            state,
            description: state.description().to_string(),
            context: context.into(),
            target_url: target_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_maps_to_success() {
        assert_eq!(CommitState::from(ConditionStatus::True), CommitState::Success);
    }

    #[test]
    fn test_false_maps_to_failure() {
        assert_eq!(CommitState::from(ConditionStatus::False), CommitState::Failure);
    }

    #[test]
    fn test_unknown_maps_to_pending() {
        assert_eq!(CommitState::from(ConditionStatus::Unknown), CommitState::Pending);
    }

    #[test]
    fn test_status_for_condition() {
        let status = CommitStatus::for_condition(
            ConditionStatus::False,
            "tekton-ci",
            "https://dashboard.example.com",
        );

        assert_eq!(status.state, CommitState::Failure);
        assert_eq!(status.description, "The build has failed");
        assert_eq!(status.context, "tekton-ci");
        assert_eq!(status.target_url, "https://dashboard.example.com");
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&CommitState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
