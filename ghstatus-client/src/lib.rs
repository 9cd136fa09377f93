//! ghstatus GitHub Client
//!
//! A small, type-safe client for the two GitHub REST calls the controller
//! makes: creating a commit status and exchanging a GitHub App identity for
//! an installation token.
//!
//! # Example
//!
//! ```no_run
//! use ghstatus_client::{
//!     ClientOptions, Credentials, GithubStatusClient, StatusPublisher, StatusTarget,
//! };
//! use ghstatus_core::domain::pipeline_run::ConditionStatus;
//! use ghstatus_core::domain::status::CommitStatus;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let target = StatusTarget {
//!         base_url: "https://github.com".to_string(),
//!         owner: "acme".to_string(),
//!         repo: "widgets".to_string(),
//!         revision: "4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string(),
//!     };
//!     let credentials = Credentials::token("ghp_example");
//!     let client = GithubStatusClient::connect(target, &credentials, &ClientOptions::default()).await?;
//!
//!     let status = CommitStatus::for_condition(
//!         ConditionStatus::True,
//!         "tekton-ci",
//!         "https://dashboard.example.com",
//!     );
//!     client.publish(&status).await?;
//!     Ok(())
//! }
//! ```

mod credentials;
mod endpoints;
pub mod error;
mod statuses;

// Re-export commonly used types
pub use credentials::{AppIdentity, Credentials};
pub use endpoints::ApiEndpoints;
pub use error::{ClientError, Result};

use async_trait::async_trait;
use ghstatus_core::domain::status::CommitStatus;
use reqwest::Client;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("ghstatus/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Publishes commit statuses for one revision
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Create one commit status. Errors are returned as-is, never retried.
    async fn publish(&self, status: &CommitStatus) -> Result<()>;
}

/// Repository and revision a status client writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTarget {
    /// Configured host, e.g. "https://github.com" or an enterprise root
    pub base_url: String,
    pub owner: String,
    pub repo: String,
    /// Commit SHA or ref the statuses are attached to
    pub revision: String,
}

/// Transport options shared by every HTTP call of a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Skip TLS certificate validation (self-hosted hosts with private CAs)
    pub insecure_skip_verify: bool,
    /// Overall request timeout, `None` for no timeout
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            insecure_skip_verify: false,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Build a reqwest client honouring these options
    pub fn build_http_client(&self) -> Result<Client> {
        if self.insecure_skip_verify {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(self.insecure_skip_verify);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder.build().map_err(ClientError::from)
    }
}

/// HTTP client for the GitHub commit status API
///
/// Immutable and bound to a single revision. One is built per
/// reconciliation and dropped afterwards.
#[derive(Debug)]
pub struct GithubStatusClient {
    endpoints: ApiEndpoints,
    target: StatusTarget,
    token: SecretString,
    insecure_skip_verify: bool,
    client: Client,
}

impl GithubStatusClient {
    /// Resolve credentials and build a client for `target`
    ///
    /// The same HTTP client, and therefore the same TLS setting, is used for
    /// the token exchange and for every later publish.
    pub async fn connect(
        target: StatusTarget,
        credentials: &Credentials,
        options: &ClientOptions,
    ) -> Result<Self> {
        let endpoints = ApiEndpoints::from_base_url(&target.base_url)?;
        let client = options
            .build_http_client()
            .map_err(|e| ClientError::AuthFailed(format!("Failed to build HTTP client: {}", e)))?;
        let token = credentials.resolve(&endpoints, &client).await?;

        Ok(Self {
            endpoints,
            target,
            token,
            insecure_skip_verify: options.insecure_skip_verify,
            client,
        })
    }

    /// Create a client with an already resolved bearer token and a custom HTTP client
    ///
    /// `insecure_skip_verify` must describe how `client` was built.
    pub fn with_client(
        target: StatusTarget,
        token: SecretString,
        client: Client,
        insecure_skip_verify: bool,
    ) -> Result<Self> {
        let endpoints = ApiEndpoints::from_base_url(&target.base_url)?;
        Ok(Self {
            endpoints,
            target,
            token,
            insecure_skip_verify,
            client,
        })
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    pub fn target(&self) -> &StatusTarget {
        &self.target
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.insecure_skip_verify
    }
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response.json().await?)
}

/// Handle an API response whose body is not needed
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(base_url: &str) -> StatusTarget {
        StatusTarget {
            base_url: base_url.to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            revision: "abc123".to_string(),
        }
    }

    #[test]
    fn test_client_creation() {
        let client = GithubStatusClient::with_client(
            target("https://github.com"),
            SecretString::from("ghp_test"),
            Client::new(),
            false,
        )
        .unwrap();
        assert!(client.endpoints().is_public());
        assert_eq!(client.target().revision, "abc123");
        assert!(!client.insecure_skip_verify());
    }

    #[test]
    fn test_client_rejects_bad_base_url() {
        let result = GithubStatusClient::with_client(
            target("::not-a-url"),
            SecretString::from("ghp_test"),
            Client::new(),
            false,
        );
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_injected_client_reports_its_tls_setting() {
        let options = ClientOptions {
            insecure_skip_verify: true,
            timeout: None,
        };
        let client = GithubStatusClient::with_client(
            target("https://github.acme.internal"),
            SecretString::from("ghp_test"),
            options.build_http_client().unwrap(),
            options.insecure_skip_verify,
        )
        .unwrap();

        assert!(client.insecure_skip_verify());
    }

    #[test]
    fn test_default_options_verify_tls() {
        let options = ClientOptions::default();
        assert!(!options.insecure_skip_verify);
        assert!(options.build_http_client().is_ok());
    }

    #[tokio::test]
    async fn test_connect_keeps_tls_toggle() {
        let options = ClientOptions {
            insecure_skip_verify: true,
            timeout: None,
        };
        let client = GithubStatusClient::connect(
            target("https://github.acme.internal"),
            &Credentials::token("ghp_test"),
            &options,
        )
        .await
        .unwrap();

        assert!(client.insecure_skip_verify());
        assert!(!client.endpoints().is_public());
    }
}
