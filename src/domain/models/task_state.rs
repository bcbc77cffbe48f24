//! Canonical task lifecycle taxonomy and the records normalized into it.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task, build job, or run.
///
/// All three upstream schemas are normalized into this closed set.
/// Variant order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Completed,
    Failed,
    Exception,
    Running,
    Pending,
    Unscheduled,
}

impl TaskState {
    /// Every state, in display order.
    pub const ALL: [TaskState; 6] = [
        Self::Completed,
        Self::Failed,
        Self::Exception,
        Self::Running,
        Self::Pending,
        Self::Unscheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Exception => "exception",
            Self::Running => "running",
            Self::Pending => "pending",
            Self::Unscheduled => "unscheduled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "exception" => Some(Self::Exception),
            "running" => Some(Self::Running),
            "pending" => Some(Self::Pending),
            "unscheduled" => Some(Self::Unscheduled),
            _ => None,
        }
    }

    /// Map a build-matrix result code: `0` passed, any other code failed,
    /// no code yet means the job has not finished.
    pub fn from_result_code(result: Option<i64>) -> Self {
        match result {
            Some(0) => Self::Completed,
            Some(_) => Self::Failed,
            None => Self::Pending,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Exception)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work normalized from a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    /// Human-readable task name (`task.metadata.name`), when upstream provides one.
    pub name: Option<String>,
    pub state: TaskState,
    /// `None` while the task has not reached a terminal state.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: impl Into<String>, state: TaskState) -> Self {
        Self {
            id: id.into(),
            name: None,
            state,
            resolved_at: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_resolved_at(mut self, resolved_at: Option<DateTime<Utc>>) -> Self {
        self.resolved_at = resolved_at;
        self
    }

    /// Two-digit stage prefix of the task name, e.g. `"04 :: generate"` is stage 4.
    ///
    /// Only used for filtering; never affects state computation.
    pub fn category(&self) -> Option<u8> {
        let name = self.name.as_deref()?;
        let prefix = name.get(..2)?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        prefix.parse().ok()
    }
}

/// Display order: lexicographic by name, unnamed tasks last, id as tie-break.
pub fn display_order(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    match (&a.name, &b.name) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    }
}

pub fn sort_for_display(tasks: &mut [TaskRecord]) {
    tasks.sort_by(display_order);
}

/// One execution attempt of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub task_id: String,
    pub run_id: u32,
    pub state: TaskState,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Per-state counts across every run of a task.
///
/// Unlike the summary, retries count: a task that failed once and then
/// completed shows one failed and one completed badge.
pub fn run_badges(runs: &[RunRecord]) -> BTreeMap<TaskState, usize> {
    let mut badges = BTreeMap::new();
    for run in runs {
        *badges.entry(run.state).or_insert(0) += 1;
    }
    badges
}

/// A single build-matrix job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    /// Display number such as `"812.3"`, when upstream provides one.
    pub number: Option<String>,
    pub state: TaskState,
    pub resolved_at: Option<DateTime<Utc>>,
}
