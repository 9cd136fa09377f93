//! Annotation settings
//!
//! Everything the controller needs to know about a pipeline run's GitHub
//! repository comes from annotations on the run itself.

use ghstatus_core::domain::pipeline_run::PipelineRun;

use crate::error::{ReconcileError, Result};

pub const ANNOTATION_GITHUB_BASE_URL: &str = "github-status-controller/github-base-url";
pub const ANNOTATION_GITHUB_OWNER: &str = "github-status-controller/github-owner";
pub const ANNOTATION_GITHUB_REPOSITORY: &str = "github-status-controller/github-repository";
pub const ANNOTATION_GITHUB_REVISION_PARAM_NAME: &str =
    "github-status-controller/github-revision-param-name";
pub const ANNOTATION_GITHUB_SECRET_NAME: &str = "github-status-controller/github-secret-name";
pub const ANNOTATION_GITHUB_SECRET_KEY: &str = "github-status-controller/github-secret-key";
pub const ANNOTATION_GITHUB_APP_ID: &str = "github-status-controller/github-app-id";
pub const ANNOTATION_GITHUB_APP_INSTALLATION_ID: &str =
    "github-status-controller/github-app-installation-id";

/// Annotations that must be present and non-empty, in validation order
pub const REQUIRED_ANNOTATIONS: [&str; 6] = [
    ANNOTATION_GITHUB_BASE_URL,
    ANNOTATION_GITHUB_OWNER,
    ANNOTATION_GITHUB_REPOSITORY,
    ANNOTATION_GITHUB_REVISION_PARAM_NAME,
    ANNOTATION_GITHUB_SECRET_NAME,
    ANNOTATION_GITHUB_SECRET_KEY,
];

/// GitHub settings of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSettings {
    pub base_url: String,
    pub owner: String,
    pub repository: String,
    /// Dotted descriptor locating the revision, `tasks.<task>.<param>`
    pub revision_param: String,
    pub secret_name: String,
    pub secret_key: String,
    /// Set when the secret holds a GitHub App private key instead of a token
    pub app: Option<AppSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub app_id: u64,
    pub installation_id: u64,
}

impl StatusSettings {
    /// Read and validate settings from the run's annotations
    pub fn from_pipeline_run(run: &PipelineRun) -> Result<Self> {
        for annotation in REQUIRED_ANNOTATIONS {
            if run.annotation(annotation).is_none_or(|value| value.trim().is_empty()) {
                return Err(ReconcileError::Config(format!(
                    "annotation '{}' is not set",
                    annotation
                )));
            }
        }

        let value = |annotation: &str| run.annotation(annotation).unwrap_or_default().to_string();

        Ok(Self {
            base_url: value(ANNOTATION_GITHUB_BASE_URL),
            owner: value(ANNOTATION_GITHUB_OWNER),
            repository: value(ANNOTATION_GITHUB_REPOSITORY),
            revision_param: value(ANNOTATION_GITHUB_REVISION_PARAM_NAME),
            secret_name: value(ANNOTATION_GITHUB_SECRET_NAME),
            secret_key: value(ANNOTATION_GITHUB_SECRET_KEY),
            app: app_settings(run)?,
        })
    }
}

fn app_settings(run: &PipelineRun) -> Result<Option<AppSettings>> {
    let app_id = run.annotation(ANNOTATION_GITHUB_APP_ID);
    let installation_id = run.annotation(ANNOTATION_GITHUB_APP_INSTALLATION_ID);

    match (app_id, installation_id) {
        (None, None) => Ok(None),
        (Some(app_id), Some(installation_id)) => Ok(Some(AppSettings {
            app_id: parse_id(ANNOTATION_GITHUB_APP_ID, app_id)?,
            installation_id: parse_id(ANNOTATION_GITHUB_APP_INSTALLATION_ID, installation_id)?,
        })),
        (Some(_), None) => Err(ReconcileError::Config(format!(
            "annotation '{}' requires '{}'",
            ANNOTATION_GITHUB_APP_ID, ANNOTATION_GITHUB_APP_INSTALLATION_ID
        ))),
        (None, Some(_)) => Err(ReconcileError::Config(format!(
            "annotation '{}' requires '{}'",
            ANNOTATION_GITHUB_APP_INSTALLATION_ID, ANNOTATION_GITHUB_APP_ID
        ))),
    }
}

fn parse_id(annotation: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        ReconcileError::Config(format!(
            "annotation '{}' must be numeric, got '{}'",
            annotation, value
        ))
    })
}
