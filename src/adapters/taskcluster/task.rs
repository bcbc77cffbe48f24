//! Single-task adapter.
//!
//! A task node contributes nothing to the summary itself: its state is
//! already counted by the owning task group. It republishes every run for
//! per-state badges and expands only the latest run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{NodeScope, NormalizedBatch, Record, RunRecord, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use super::client::TaskclusterClient;

#[derive(Debug)]
pub struct TaskAdapter {
    client: Arc<TaskclusterClient>,
}

impl TaskAdapter {
    pub fn new(client: Arc<TaskclusterClient>) -> Self {
        Self { client }
    }

    pub fn normalize(root_url: &str, runs: Vec<RunRecord>) -> NormalizedBatch {
        let children = runs
            .iter()
            .max_by_key(|run| run.run_id)
            .map(|latest| NodeScope::Run {
                root_url: root_url.to_string(),
                task_id: latest.task_id.clone(),
                run_id: latest.run_id,
            })
            .into_iter()
            .collect();

        NormalizedBatch::new()
            .with_records(runs.into_iter().map(Record::Run).collect())
            .with_children(children)
    }
}

#[async_trait]
impl NodeAdapter for TaskAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::Task
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let NodeScope::Task { root_url, task_id } = scope else {
            return Err(FetchError::InvalidTarget(format!("task cannot serve {scope}")));
        };
        let status = self.client.task_status(root_url, task_id).await?;
        Ok(Self::normalize(root_url, status.run_records()?))
    }
}
