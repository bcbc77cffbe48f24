//! Status-list adapter.
//!
//! Serves two tree levels from the same endpoint:
//! - a [`NodeScope::Commit`] fans out into one context child per distinct
//!   status context;
//! - a [`NodeScope::Context`] keeps only that context's live statuses and
//!   fans out into one status child per distinct target URL.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::commit::{distinct_contexts, live_statuses};
use crate::domain::models::{NodeScope, NormalizedBatch, Record, StatusRecord, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use super::client::GitHubClient;

#[derive(Debug)]
pub struct StatusListAdapter {
    client: Arc<GitHubClient>,
}

impl StatusListAdapter {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self { client }
    }

    /// Commit level: every status, one child per context.
    pub fn normalize_commit(sha: &str, statuses: Vec<StatusRecord>) -> NormalizedBatch {
        let children = distinct_contexts(&statuses)
            .into_iter()
            .map(|context| NodeScope::Context {
                sha: sha.to_string(),
                context,
            })
            .collect();
        NormalizedBatch::new()
            .with_records(statuses.into_iter().map(Record::Status).collect())
            .with_children(children)
    }

    /// Context level: the live statuses of one context.
    ///
    /// Every live status is kept as a record, but reports sharing a target
    /// URL (a rerun reporting on the same task group) expand into a single
    /// child: the most recently updated one, higher id on ties. Statuses
    /// without a target URL have nothing to expand and produce a record but
    /// no child.
    pub fn normalize_context(context: &str, statuses: &[StatusRecord]) -> NormalizedBatch {
        let live = live_statuses(statuses, context);

        let mut newest: BTreeMap<&str, &StatusRecord> = BTreeMap::new();
        for status in &live {
            let Some(target_url) = status.target_url.as_deref() else {
                continue;
            };
            newest
                .entry(target_url)
                .and_modify(|current| {
                    if (status.updated_at, status.id) > (current.updated_at, current.id) {
                        *current = status;
                    }
                })
                .or_insert(status);
        }
        let children = newest
            .into_iter()
            .map(|(target_url, s)| NodeScope::Status {
                id: s.id,
                context: s.context.clone(),
                target_url: target_url.to_string(),
            })
            .collect();

        NormalizedBatch::new()
            .with_records(live.into_iter().map(Record::Status).collect())
            .with_children(children)
    }

    async fn statuses(&self, sha: &str) -> FetchResult<Vec<StatusRecord>> {
        let statuses = self.client.list_statuses(sha).await?;
        Ok(statuses.iter().map(StatusRecord::from).collect())
    }
}

#[async_trait]
impl NodeAdapter for StatusListAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::StatusList
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        match scope {
            NodeScope::Commit { sha } => {
                let statuses = self.statuses(sha).await?;
                Ok(Self::normalize_commit(sha, statuses))
            }
            NodeScope::Context { sha, context } => {
                let statuses = self.statuses(sha).await?;
                Ok(Self::normalize_context(context, &statuses))
            }
            other => Err(FetchError::InvalidTarget(format!(
                "status list cannot serve {other}"
            ))),
        }
    }
}
