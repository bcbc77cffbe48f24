//! The normalized output of one adapter fetch.

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactRecord;
use super::commit::{CommitRecord, StatusRecord};
use super::image::ImageReference;
use super::scope::NodeScope;
use super::summary::Summary;
use super::task_state::{JobRecord, RunRecord, TaskRecord};

/// One normalized upstream entity, republished for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    Commit(CommitRecord),
    Status(StatusRecord),
    Job(JobRecord),
    Task(TaskRecord),
    Run(RunRecord),
    Artifact(ArtifactRecord),
    Image(ImageReference),
}

/// Everything a node learns from a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Raw records for this node's scope.
    pub records: Vec<Record>,
    /// The child entity set; reconciled by [`NodeScope::id`].
    pub children: Vec<NodeScope>,
    /// This node's own contribution, replacing the previous one.
    pub local: Summary,
}

impl NormalizedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }

    pub fn with_children(mut self, children: Vec<NodeScope>) -> Self {
        self.children = children;
        self
    }

    pub fn with_local(mut self, local: Summary) -> Self {
        self.local = local;
        self
    }
}
