//! Commit status endpoint

use async_trait::async_trait;
use ghstatus_core::domain::status::CommitStatus;
use ghstatus_core::dto::status::CreateStatus;
use reqwest::header::ACCEPT;
use secrecy::ExposeSecret;

use crate::error::Result;
use crate::{GITHUB_ACCEPT, GITHUB_API_VERSION, GithubStatusClient, StatusPublisher};

#[async_trait]
impl StatusPublisher for GithubStatusClient {
    /// Create a commit status on the target revision
    ///
    /// Issues `POST /repos/{owner}/{repo}/statuses/{revision}`.
    async fn publish(&self, status: &CommitStatus) -> Result<()> {
        let url = self.endpoints.rest_url(&[
            "repos",
            &self.target.owner,
            &self.target.repo,
            "statuses",
            &self.target.revision,
        ])?;

        tracing::debug!(
            "Publishing '{}' status to {}/{}@{}",
            status.state,
            self.target.owner,
            self.target.repo,
            self.target.revision
        );

        let response = self
            .client
            .post(url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(self.token.expose_secret())
            .json(&CreateStatus::from(status))
            .send()
            .await?;

        crate::handle_empty_response(response).await
    }
}
