//! GitHub HTTP client.
//!
//! Typed, read-only wrapper around the two GitHub REST endpoints the
//! dashboard needs: the repository commit list and the per-commit status
//! list. Rate limiting and timeouts come from the shared
//! [`UpstreamClient`].

use reqwest::header::HeaderMap;

use crate::adapters::http::{github_headers, UpstreamClient};
use crate::domain::errors::FetchResult;
use crate::domain::models::GitHubConfig;

use super::models::{GitHubCommit, GitHubStatus};

/// HTTP client for the GitHub REST API v3.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    upstream: UpstreamClient,
    api_base: String,
    owner: String,
    repo: String,
    headers: HeaderMap,
}

impl GitHubClient {
    pub fn new(upstream: UpstreamClient, config: &GitHubConfig) -> Self {
        Self {
            upstream,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            headers: github_headers(config.token.as_deref()),
        }
    }

    fn repo_url(&self) -> String {
        format!("{}/repos/{}/{}", self.api_base, self.owner, self.repo)
    }

    /// List the most recent commits on the default branch, newest first.
    pub async fn list_commits(&self) -> FetchResult<Vec<GitHubCommit>> {
        let url = format!("{}/commits", self.repo_url());
        self.upstream.get_json_with(&url, &self.headers).await
    }

    /// List every status reported against `sha`, newest first.
    pub async fn list_statuses(&self, sha: &str) -> FetchResult<Vec<GitHubStatus>> {
        let url = format!("{}/commits/{}/statuses", self.repo_url(), sha);
        self.upstream.get_json_with(&url, &self.headers).await
    }
}
