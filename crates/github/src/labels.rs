//! Label application: the [`IssueTracker`] implementation.

use async_trait::async_trait;
use pipeline::{IssueRef, IssueTracker, LabelName, TrackerError};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{GithubClient, GithubError};

#[derive(Debug, Serialize)]
struct AddLabelsBody<'a> {
    labels: &'a [LabelName],
}

impl From<GithubError> for TrackerError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Status { status, body } => TrackerError::Status { status, body },
            other => TrackerError::Transport(other.to_string()),
        }
    }
}

impl GithubClient {
    /// `POST /repos/{owner}/{repo}/issues/{number}/labels`.
    pub async fn add_labels_to_issue(
        &self,
        issue: &IssueRef,
        labels: &[LabelName],
    ) -> Result<(), GithubError> {
        let url = self.url(&format!(
            "/repos/{}/{}/issues/{}/labels",
            issue.repository.owner, issue.repository.name, issue.number
        ));
        let response = self
            .authorize(self.http.post(url))
            .json(&AddLabelsBody { labels })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for GithubClient {
    #[instrument(name = "github.add_labels", skip_all, fields(issue = %issue))]
    async fn add_labels(&self, issue: &IssueRef, labels: &[LabelName]) -> Result<(), TrackerError> {
        self.add_labels_to_issue(issue, labels).await?;
        info!(count = labels.len(), "labels applied");
        Ok(())
    }
}
