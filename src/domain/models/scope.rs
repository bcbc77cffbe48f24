//! Node scopes: the identity of every position in the aggregation tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which adapter a node is bound to. Chosen once, when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    /// Source-control commit list.
    CommitList,
    /// Source-control status list for one commit.
    StatusList,
    /// Pure dispatch from a status report to its build or task group.
    StatusTarget,
    /// Build-matrix API.
    BuildMatrix,
    /// Workload-queue task-group listing.
    TaskGroup,
    /// Workload-queue single task status.
    Task,
    /// Workload-queue run artifacts.
    RunArtifacts,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommitList => "commit_list",
            Self::StatusList => "status_list",
            Self::StatusTarget => "status_target",
            Self::BuildMatrix => "build_matrix",
            Self::TaskGroup => "task_group",
            Self::Task => "task",
            Self::RunArtifacts => "run_artifacts",
        }
    }
}

/// A position in the tree, carrying everything its adapter needs to fetch.
///
/// Ownership is strictly hierarchical:
/// `Dashboard ⊃ Commit ⊃ Context ⊃ Status ⊃ (Build | TaskGroup ⊃ Task ⊃ Run)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum NodeScope {
    /// Root: the recent commit list.
    Dashboard,
    Commit {
        sha: String,
    },
    Context {
        sha: String,
        context: String,
    },
    Status {
        id: u64,
        context: String,
        target_url: String,
    },
    Build {
        build_id: u64,
    },
    TaskGroup {
        root_url: String,
        group_id: String,
    },
    Task {
        root_url: String,
        task_id: String,
    },
    Run {
        root_url: String,
        task_id: String,
        run_id: u32,
    },
}

impl NodeScope {
    /// Stable identity among siblings, used for child reconciliation.
    pub fn id(&self) -> String {
        match self {
            Self::Dashboard => "dashboard".to_string(),
            Self::Commit { sha } => sha.clone(),
            Self::Context { context, .. } => context.clone(),
            Self::Status { id, .. } => id.to_string(),
            Self::Build { build_id } => build_id.to_string(),
            Self::TaskGroup { group_id, .. } => group_id.clone(),
            Self::Task { task_id, .. } => task_id.clone(),
            Self::Run { task_id, run_id, .. } => format!("{task_id}/{run_id}"),
        }
    }

    /// Short label for logs, e.g. `task_group`.
    pub fn level(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Commit { .. } => "commit",
            Self::Context { .. } => "context",
            Self::Status { .. } => "status",
            Self::Build { .. } => "build",
            Self::TaskGroup { .. } => "task_group",
            Self::Task { .. } => "task",
            Self::Run { .. } => "run",
        }
    }

    /// The adapter kind this scope is served by.
    pub fn kind(&self) -> UpstreamKind {
        match self {
            Self::Dashboard => UpstreamKind::CommitList,
            Self::Commit { .. } | Self::Context { .. } => UpstreamKind::StatusList,
            Self::Status { .. } => UpstreamKind::StatusTarget,
            Self::Build { .. } => UpstreamKind::BuildMatrix,
            Self::TaskGroup { .. } => UpstreamKind::TaskGroup,
            Self::Task { .. } => UpstreamKind::Task,
            Self::Run { .. } => UpstreamKind::RunArtifacts,
        }
    }
}

impl fmt::Display for NodeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level(), self.id())
    }
}
