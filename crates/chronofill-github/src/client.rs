//! GitHub pull request client
//!
//! Opens and merges pull requests through the REST API. Calls are never
//! retried; idempotency is left to GitHub.

use async_trait::async_trait;
use chronofill_core::{
    CreatedPullRequest, FillResult, GitHubSettings, MergeMethod, NewPullRequest, PullRequestApi,
    RepoIdentity,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GitHubError, Result};

/// API version pinned in every request
pub const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize)]
struct CreatePullBody<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

#[derive(Debug, Serialize)]
struct MergeBody {
    merge_method: MergeMethod,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    /// Create a client authenticated with the settings' token
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|e| GitHubError::InvalidSettings(format!("token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .user_agent(concat!("chronofill/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(GitHubClient {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn pulls_url(&self, repo: &RepoIdentity) -> String {
        format!("{}/repos/{}/{}/pulls", self.api_url, repo.owner, repo.repo_name)
    }

    /// Open a pull request
    pub async fn open_pull_request(&self, request: &NewPullRequest) -> Result<CreatedPullRequest> {
        let url = self.pulls_url(&request.repo);
        debug!(url = %url, head = %request.head, base = %request.base, "creating pull request");

        let response = self
            .http
            .post(&url)
            .json(&CreatePullBody {
                title: &request.title,
                head: &request.head,
                base: &request.base,
                body: &request.body,
            })
            .send()
            .await?;

        let pull: PullResponse = read_json(response).await?;
        Ok(CreatedPullRequest {
            number: pull.number,
            html_url: pull.html_url,
        })
    }

    /// Merge a pull request with the given method
    pub async fn merge(&self, repo: &RepoIdentity, number: u64, method: MergeMethod) -> Result<()> {
        let url = format!("{}/{}/merge", self.pulls_url(repo), number);
        debug!(url = %url, method = %method, "merging pull request");

        let response = self
            .http
            .put(&url)
            .json(&MergeBody {
                merge_method: method,
            })
            .send()
            .await?;

        let merge: MergeResponse = read_json(response).await?;
        if !merge.merged {
            return Err(GitHubError::NotMerged {
                number,
                message: merge.message,
            });
        }
        Ok(())
    }
}

/// Decode a success body, or turn an error status into [`GitHubError::Api`]
async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(GitHubError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn create_pull_request(&self, request: &NewPullRequest) -> FillResult<CreatedPullRequest> {
        Ok(self.open_pull_request(request).await?)
    }

    async fn merge_pull_request(
        &self,
        repo: &RepoIdentity,
        number: u64,
        method: MergeMethod,
    ) -> FillResult<()> {
        Ok(self.merge(repo, number, method).await?)
    }
}
