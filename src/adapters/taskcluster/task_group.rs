//! Task-group adapter: the task list of one decision-task group.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::task_state::sort_for_display;
use crate::domain::models::{NodeScope, NormalizedBatch, Record, Summary, TaskRecord, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use super::client::TaskclusterClient;
use super::models::TaskGroupEntry;

#[derive(Debug)]
pub struct TaskGroupAdapter {
    client: Arc<TaskclusterClient>,
}

impl TaskGroupAdapter {
    pub fn new(client: Arc<TaskclusterClient>) -> Self {
        Self { client }
    }

    /// Tasks become records and the group's local per-state summary; each
    /// task id becomes a child.
    pub fn normalize(root_url: &str, entries: &[TaskGroupEntry]) -> FetchResult<NormalizedBatch> {
        let mut tasks = entries
            .iter()
            .map(|entry| entry.status.to_record(entry.name()))
            .collect::<FetchResult<Vec<TaskRecord>>>()?;
        sort_for_display(&mut tasks);

        let local = Summary::from_tasks(&tasks);
        let children = tasks
            .iter()
            .map(|task| NodeScope::Task {
                root_url: root_url.to_string(),
                task_id: task.id.clone(),
            })
            .collect();

        Ok(NormalizedBatch::new()
            .with_records(tasks.into_iter().map(Record::Task).collect())
            .with_children(children)
            .with_local(local))
    }
}

#[async_trait]
impl NodeAdapter for TaskGroupAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::TaskGroup
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let NodeScope::TaskGroup { root_url, group_id } = scope else {
            return Err(FetchError::InvalidTarget(format!(
                "task group cannot serve {scope}"
            )));
        };
        let entries = self.client.list_task_group(root_url, group_id).await?;
        Self::normalize(root_url, &entries)
    }
}
