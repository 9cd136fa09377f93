//! Event predicates
//!
//! Filters applied to the watch feed before anything is reconciled.

use ghstatus_core::domain::pipeline_run::{Condition, PipelineRun};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Equality-based label selector, e.g. `github-status-controller=enabled,team=web`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    /// True when every selector label is present with the same value
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

impl FromStr for LabelSelector {
    type Err = anyhow::Error;

    fn from_str(selector: &str) -> anyhow::Result<Self> {
        let mut match_labels = BTreeMap::new();

        for requirement in selector.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let (key, value) = requirement
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Invalid label requirement '{}'", requirement))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("Invalid label requirement '{}': empty key", requirement);
            }
            match_labels.insert(key.to_string(), value.trim().to_string());
        }

        Ok(Self { match_labels })
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let requirements: Vec<String> = self
            .match_labels
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        write!(f, "{}", requirements.join(","))
    }
}

/// Whether an update changed anything the controller reacts to
///
/// `reconciled` is the condition set last reconciled successfully. Without
/// one every update counts as changed; otherwise only a different condition
/// set does.
pub fn status_changed(reconciled: Option<&[Condition]>, current: &PipelineRun) -> bool {
    match reconciled {
        None => true,
        Some(reconciled) => reconciled != current.conditions(),
    }
}
