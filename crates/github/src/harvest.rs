//! Historical issue harvesting for training data.
//!
//! Issues are listed one page at a time through a lazy stream. The caller drains
//! it; the stream stops at the last page GitHub reports or at `max_pages`,
//! whichever comes first, so a harvest always terminates.

use futures::stream::{self, BoxStream, StreamExt};
use pipeline::RepositoryRef;
use reqwest::header::LINK;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GithubClient, GithubError};

/// Page size requested from the list endpoint (GitHub's maximum).
pub const PER_PAGE: usize = 100;

/// The fields of an issue kept for training data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestedIssue {
    pub repository_url: String,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// One page of harvested issues.
#[derive(Debug, Clone)]
pub struct IssuePage {
    pub page: u32,
    pub issues: Vec<HarvestedIssue>,
    pub has_next: bool,
}

/// Lazy sequence of issue pages for one repository.
pub type IssuePages<'a> = BoxStream<'a, Result<IssuePage, GithubError>>;

#[derive(Debug, Deserialize)]
struct ApiIssue {
    repository_url: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    // Present only on pull requests, which the issues endpoint also returns.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

impl From<ApiIssue> for HarvestedIssue {
    fn from(issue: ApiIssue) -> Self {
        Self {
            repository_url: issue.repository_url,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

fn link_has_next(link: &str) -> bool {
    link.split(',').any(|part| part.contains("rel=\"next\""))
}

impl GithubClient {
    /// Fetches one page of `GET /repos/{owner}/{repo}/issues?state=all`.
    ///
    /// Pull requests are dropped from the page.
    pub async fn list_issues_page(
        &self,
        repo: &RepositoryRef,
        page: u32,
    ) -> Result<IssuePage, GithubError> {
        let url = self.url(&format!("/repos/{}/{}/issues", repo.owner, repo.name));
        let response = self
            .authorize(self.http.get(url))
            .query(&[
                ("state", "all".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;

        let link = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(link_has_next);
        let raw: Vec<ApiIssue> = response.json().await?;

        // Without a Link header, a full page is the only hint that more follow.
        let has_next = link.unwrap_or(raw.len() == PER_PAGE);
        let issues: Vec<HarvestedIssue> = raw
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(HarvestedIssue::from)
            .collect();

        debug!(%repo, page, count = issues.len(), has_next, "issue page fetched");
        Ok(IssuePage {
            page,
            issues,
            has_next,
        })
    }

    /// Returns a lazy stream over every issue page of `repo`, stopping after
    /// `max_pages` pages at most. The first error ends the stream.
    pub fn issue_pages(&self, repo: RepositoryRef, max_pages: u32) -> IssuePages<'_> {
        stream::try_unfold(Some(1u32), move |next| {
            let repo = repo.clone();
            async move {
                let Some(page) = next.filter(|p| *p <= max_pages) else {
                    return Ok::<_, GithubError>(None);
                };
                let fetched = self.list_issues_page(&repo, page).await?;
                let next = fetched.has_next.then_some(page + 1);
                Ok::<_, GithubError>(Some((fetched, next)))
            }
        })
        .boxed()
    }
}
