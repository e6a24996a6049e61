//! Authenticated GitHub REST client shared by label application and harvesting.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use thiserror::Error;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default bound on one request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Personal access or installation token. Anonymous when `None`.
    pub token: Option<String>,
    pub user_agent: String,
    /// Applied to every request. A stalled response fails as
    /// [`GithubError::Transport`].
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: "LabelCat".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Errors talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub client could not be built: {0}")]
    Client(String),

    #[error("GitHub transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Thin wrapper over [`reqwest::Client`] with GitHub headers preset.
pub struct GithubClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: GithubConfig,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GithubError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Converts a non-success response into [`GithubError::Status`].
    pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GithubError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
