//! Status client factory
//!
//! Builds one status publisher per reconciliation. The factory is the seam
//! between the reconciler and GitHub, so tests can record publishes instead.

use async_trait::async_trait;
use ghstatus_client::{ClientOptions, Credentials, GithubStatusClient, StatusPublisher, StatusTarget};

/// Factory trait for status publishers
#[async_trait]
pub trait StatusClientFactory: Send + Sync {
    /// Resolves credentials and returns a publisher bound to `target`
    async fn connect(
        &self,
        target: StatusTarget,
        credentials: Credentials,
    ) -> ghstatus_client::Result<Box<dyn StatusPublisher>>;
}

/// Factory producing real GitHub clients
pub struct GithubClientFactory {
    options: ClientOptions,
}

impl GithubClientFactory {
    /// Creates a factory whose clients share `options` (TLS toggle, timeout)
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl StatusClientFactory for GithubClientFactory {
    async fn connect(
        &self,
        target: StatusTarget,
        credentials: Credentials,
    ) -> ghstatus_client::Result<Box<dyn StatusPublisher>> {
        let client = GithubStatusClient::connect(target, &credentials, &self.options).await?;
        Ok(Box::new(client))
    }
}
