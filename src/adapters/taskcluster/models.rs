//! Taskcluster queue API models.
//!
//! Only the fields the dashboard reads are modelled; everything else in the
//! queue responses is ignored by serde.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{RunRecord, TaskRecord, TaskState};

/// One page of `GET /api/queue/v1/task-group/{id}/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroupPage {
    #[serde(default)]
    pub tasks: Vec<TaskGroupEntry>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskGroupEntry {
    pub status: TaskStatus,
    #[serde(default)]
    pub task: Option<TaskDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskDefinition {
    #[serde(default)]
    pub metadata: Option<TaskMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `GET /api/queue/v1/task/{taskId}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    pub task_id: String,
    pub state: String,
    #[serde(default)]
    pub runs: Vec<TaskRun>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    pub run_id: u32,
    pub state: String,
    #[serde(default)]
    pub resolved: Option<DateTime<Utc>>,
}

/// One page of `GET /api/queue/v1/task/{taskId}/runs/{runId}/artifacts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactPage {
    #[serde(default)]
    pub artifacts: Vec<QueueArtifact>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueArtifact {
    pub name: String,
    #[serde(default)]
    pub content_type: String,
}

/// Body of a launch-configuration artifact.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfigDocument {
    #[serde(default)]
    pub launch_configs: Vec<LaunchConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(default)]
    pub storage_profile: Option<StorageProfile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    #[serde(default)]
    pub image_reference: Option<ImageReferenceField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageReferenceField {
    #[serde(default)]
    pub id: Option<String>,
}

impl LaunchConfigDocument {
    /// Every image reference id present, in document order.
    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.launch_configs.iter().filter_map(|config| {
            config
                .storage_profile
                .as_ref()?
                .image_reference
                .as_ref()?
                .id
                .as_deref()
        })
    }
}

fn parse_state(raw: &str, task_id: &str) -> FetchResult<TaskState> {
    TaskState::from_str(raw)
        .ok_or_else(|| FetchError::Parse(format!("task {task_id}: unknown state {raw:?}")))
}

impl TaskStatus {
    /// Resolution time of the last run, if any run exists.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.runs.last().and_then(|run| run.resolved)
    }

    pub fn to_record(&self, name: Option<&str>) -> FetchResult<TaskRecord> {
        let state = parse_state(&self.state, &self.task_id)?;
        let mut record =
            TaskRecord::new(self.task_id.clone(), state).with_resolved_at(self.resolved_at());
        if let Some(name) = name {
            record = record.with_name(name);
        }
        Ok(record)
    }

    pub fn run_records(&self) -> FetchResult<Vec<RunRecord>> {
        self.runs
            .iter()
            .map(|run| {
                Ok(RunRecord {
                    task_id: self.task_id.clone(),
                    run_id: run.run_id,
                    state: parse_state(&run.state, &self.task_id)?,
                    resolved_at: run.resolved,
                })
            })
            .collect()
    }
}

impl TaskGroupEntry {
    pub fn name(&self) -> Option<&str> {
        self.task
            .as_ref()?
            .metadata
            .as_ref()?
            .name
            .as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_at_uses_last_run() {
        let status: TaskStatus = serde_json::from_value(serde_json::json!({
            "taskId": "t1",
            "state": "completed",
            "runs": [
                { "runId": 0, "state": "exception", "resolved": "2024-01-01T00:00:00Z" },
                { "runId": 1, "state": "completed", "resolved": "2024-01-01T01:00:00Z" }
            ]
        }))
        .unwrap();
        assert_eq!(status.resolved_at(), Some("2024-01-01T01:00:00Z".parse().unwrap()));
        assert_eq!(status.run_records().unwrap().len(), 2);
    }

    #[test]
    fn test_task_without_runs_is_unresolved() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"taskId": "t2", "state": "unscheduled"}"#).unwrap();
        let record = status.to_record(Some("01 :: prep")).unwrap();
        assert_eq!(record.resolved_at, None);
        assert_eq!(record.state, TaskState::Unscheduled);
        assert_eq!(record.category(), Some(1));
    }

    #[test]
    fn test_unknown_state_is_parse_error() {
        let status: TaskStatus =
            serde_json::from_str(r#"{"taskId": "t3", "state": "exploded"}"#).unwrap();
        assert!(matches!(status.to_record(None), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_launch_config_image_ids_skip_missing_fields() {
        let doc: LaunchConfigDocument = serde_json::from_value(serde_json::json!({
            "launchConfigs": [
                { "storageProfile": { "imageReference": { "id": "/images/a" } } },
                { "storageProfile": {} },
                {}
            ]
        }))
        .unwrap();
        assert_eq!(doc.image_ids().collect::<Vec<_>>(), vec!["/images/a"]);
    }
}
