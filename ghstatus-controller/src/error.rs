//! Reconciliation errors

use ghstatus_client::ClientError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Why a reconciliation stopped early
///
/// Every variant is handed back to the dispatcher unmodified; nothing is
/// retried inside a reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Missing or malformed annotation or secret entry
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Revision descriptor is not `tasks.<task>.<param>`
    #[error("Invalid format: {0}")]
    Format(String),

    /// Credentials could not be turned into a bearer token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Revision is not recorded on the pipeline run
    #[error("Not found: {0}")]
    NotFound(String),

    /// Secret store or GitHub call failed
    #[error("Remote call failed: {0}")]
    Remote(String),
}

impl From<ClientError> for ReconcileError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidConfig(message) => ReconcileError::Config(message),
            ClientError::AuthFailed(message) => ReconcileError::Auth(message),
            other @ (ClientError::RequestFailed(_) | ClientError::ApiError { .. }) => {
                ReconcileError::Remote(other.to_string())
            }
        }
    }
}
