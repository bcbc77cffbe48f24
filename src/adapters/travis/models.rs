//! Travis CI v2 build API models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::{JobRecord, TaskState};

/// Response of `GET /repos/{slug}/builds/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TravisBuild {
    /// Parallel jobs of the build, in upstream order.
    #[serde(default)]
    pub matrix: Vec<TravisJob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TravisJob {
    pub id: u64,
    #[serde(default)]
    pub number: Option<String>,
    /// Exit code; null while the job has not finished.
    #[serde(default)]
    pub result: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&TravisJob> for JobRecord {
    fn from(job: &TravisJob) -> Self {
        JobRecord {
            id: job.id.to_string(),
            number: job.number.clone(),
            state: TaskState::from_result_code(job.result),
            resolved_at: job.finished_at,
        }
    }
}
