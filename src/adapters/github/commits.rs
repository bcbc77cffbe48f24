//! Commit-list adapter: the dashboard root.
//!
//! Fetches the recent commit list and bounds it to the configured number
//! of commits. Each kept commit becomes a [`NodeScope::Commit`] child.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{CommitRecord, NodeScope, NormalizedBatch, Record, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use super::client::GitHubClient;
use super::models::GitHubCommit;

#[derive(Debug)]
pub struct CommitListAdapter {
    client: Arc<GitHubClient>,
    limit: usize,
}

impl CommitListAdapter {
    pub fn new(client: Arc<GitHubClient>, limit: usize) -> Self {
        Self { client, limit }
    }

    /// Normalize an upstream commit list, keeping the newest `limit`.
    pub fn normalize(commits: &[GitHubCommit], limit: usize) -> NormalizedBatch {
        let kept: Vec<CommitRecord> = commits.iter().take(limit).map(CommitRecord::from).collect();
        let children = kept
            .iter()
            .map(|c| NodeScope::Commit { sha: c.sha.clone() })
            .collect();
        NormalizedBatch::new()
            .with_records(kept.into_iter().map(Record::Commit).collect())
            .with_children(children)
    }
}

#[async_trait]
impl NodeAdapter for CommitListAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::CommitList
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        if !matches!(scope, NodeScope::Dashboard) {
            return Err(FetchError::InvalidTarget(format!(
                "commit list cannot serve {scope}"
            )));
        }
        let commits = self.client.list_commits().await?;
        tracing::debug!(
            fetched = commits.len(),
            limit = self.limit,
            "Fetched commit list"
        );
        Ok(Self::normalize(&commits, self.limit))
    }
}
