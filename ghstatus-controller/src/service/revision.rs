//! Revision locator
//!
//! Finds the commit a pipeline run built by reading one parameter of one task
//! in the run's recorded pipeline spec.

use ghstatus_core::domain::pipeline_run::PipelineTask;
use std::str::FromStr;

use crate::error::{ReconcileError, Result};

/// Parsed `tasks.<task>.<param>` descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionDescriptor {
    pub task: String,
    pub param: String,
}

impl FromStr for RevisionDescriptor {
    type Err = ReconcileError;

    /// The first segment is a marker and is not interpreted.
    fn from_str(descriptor: &str) -> Result<Self> {
        let parts: Vec<&str> = descriptor.split('.').collect();
        match parts.as_slice() {
            [_, task, param] => Ok(Self {
                task: task.to_string(),
                param: param.to_string(),
            }),
            _ => Err(ReconcileError::Format(format!(
                "revision param name '{}' must have the form tasks.<task-name>.<param-name>",
                descriptor
            ))),
        }
    }
}

/// Return the revision the descriptor points at
///
/// The first task with a matching name is the only one searched; within it
/// the first matching parameter wins.
pub fn locate<'a>(tasks: &'a [PipelineTask], descriptor: &RevisionDescriptor) -> Result<&'a str> {
    let not_found = || {
        ReconcileError::NotFound(format!(
            "{} not found in task {}",
            descriptor.param, descriptor.task
        ))
    };

    let task = tasks
        .iter()
        .find(|task| task.name == descriptor.task)
        .ok_or_else(not_found)?;

    task.params
        .iter()
        .find(|param| param.name == descriptor.param)
        .and_then(|param| param.value.as_str())
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghstatus_core::domain::pipeline_run::{Param, ParamValue};

    fn task(name: &str, params: &[(&str, &str)]) -> PipelineTask {
        PipelineTask {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(name, value)| Param {
                    name: name.to_string(),
                    value: ParamValue::from(*value),
                })
                .collect(),
        }
    }

    fn descriptor(value: &str) -> RevisionDescriptor {
        value.parse().unwrap()
    }

    #[test]
    fn test_parse_three_segments() {
        let parsed = descriptor("tasks.build.GIT_REVISION");
        assert_eq!(parsed.task, "build");
        assert_eq!(parsed.param, "GIT_REVISION");
    }

    #[test]
    fn test_parse_rejects_two_segments() {
        let result = "build.GIT_REVISION".parse::<RevisionDescriptor>();
        assert!(matches!(result, Err(ReconcileError::Format(_))));
    }

    #[test]
    fn test_parse_rejects_four_segments() {
        let result = "tasks.build.params.GIT_REVISION".parse::<RevisionDescriptor>();
        assert!(matches!(result, Err(ReconcileError::Format(_))));
    }

    #[test]
    fn test_locate_revision() {
        let tasks = vec![
            task("lint", &[("GIT_REVISION", "zzz999")]),
            task("build", &[("IMAGE", "acme/widgets"), ("GIT_REVISION", "abc123")]),
        ];

        let revision = locate(&tasks, &descriptor("tasks.build.GIT_REVISION")).unwrap();
        assert_eq!(revision, "abc123");
    }

    #[test]
    fn test_locate_missing_task() {
        let tasks = vec![task("test", &[("GIT_REVISION", "abc123")])];

        let result = locate(&tasks, &descriptor("tasks.build.GIT_REVISION"));
        assert!(matches!(result, Err(ReconcileError::NotFound(_))));
    }

    #[test]
    fn test_locate_missing_param() {
        let tasks = vec![task("build", &[("IMAGE", "acme/widgets")])];

        let result = locate(&tasks, &descriptor("tasks.build.GIT_REVISION"));
        assert!(matches!(result, Err(ReconcileError::NotFound(_))));
    }

    #[test]
    fn test_locate_first_task_wins() {
        let tasks = vec![
            task("build", &[("GIT_REVISION", "first")]),
            task("build", &[("GIT_REVISION", "second")]),
        ];

        let revision = locate(&tasks, &descriptor("tasks.build.GIT_REVISION")).unwrap();
        assert_eq!(revision, "first");
    }

    #[test]
    fn test_locate_ignores_array_values() {
        let tasks = vec![PipelineTask {
            name: "build".to_string(),
            params: vec![Param {
                name: "GIT_REVISION".to_string(),
                value: ParamValue::Array(vec!["abc123".to_string()]),
            }],
        }];

        let result = locate(&tasks, &descriptor("tasks.build.GIT_REVISION"));
        assert!(matches!(result, Err(ReconcileError::NotFound(_))));
    }
}
