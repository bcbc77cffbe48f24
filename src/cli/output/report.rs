//! Serializable dashboard report shared by `watch` and `snapshot`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::{Summary, TaskState};
use crate::services::{CommitRow, DashboardView, TaskRow};

use super::{CommandOutput, TableFormatter};

/// One commit's rolled-up counts.
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub sha: String,
    pub short_sha: String,
    pub headline: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub counts: BTreeMap<TaskState, usize>,
    pub images: BTreeMap<String, u64>,
    /// Nodes under this commit whose last fetch failed
    pub stale: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskSummary>,
}

/// One task with its per-run state badges.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    pub id: String,
    pub name: Option<String>,
    pub stage: Option<u8>,
    pub state: TaskState,
    pub runs: BTreeMap<TaskState, usize>,
}

impl From<&TaskRow> for TaskSummary {
    fn from(row: &TaskRow) -> Self {
        Self {
            id: row.task.id.clone(),
            name: row.task.name.clone(),
            stage: row.task.category(),
            state: row.task.state,
            runs: row.runs.clone(),
        }
    }
}

impl From<&CommitRow> for CommitSummary {
    fn from(row: &CommitRow) -> Self {
        Self {
            sha: row.commit.sha.clone(),
            short_sha: row.commit.short_sha().to_string(),
            headline: row.commit.headline().to_string(),
            author: row.commit.author.name.clone(),
            timestamp: row.commit.timestamp,
            counts: counts(&row.summary),
            images: row.summary.images().clone(),
            stale: row.stale,
            tasks: Vec::new(),
        }
    }
}

fn counts(summary: &Summary) -> BTreeMap<TaskState, usize> {
    summary.counts().into_iter().filter(|(_, n)| *n > 0).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub commits: Vec<CommitSummary>,
    pub totals: BTreeMap<TaskState, usize>,
    pub images: BTreeMap<String, u64>,
    pub stale_nodes: usize,
}

impl DashboardReport {
    pub fn new(view: &DashboardView, root: &Summary) -> Self {
        Self {
            generated_at: Utc::now(),
            commits: view.commits().iter().map(CommitSummary::from).collect(),
            totals: counts(root),
            images: root.images().clone(),
            stale_nodes: view.stale_count(),
        }
    }

    /// List each commit's tasks, optionally only those of one stage.
    #[must_use]
    pub fn with_tasks(mut self, view: &DashboardView, stage: Option<u8>) -> Self {
        for commit in &mut self.commits {
            commit.tasks = view
                .tasks(&commit.sha, stage)
                .iter()
                .map(TaskSummary::from)
                .collect();
        }
        self
    }
}

impl CommandOutput for DashboardReport {
    fn to_human(&self) -> String {
        if self.commits.is_empty() {
            return "No commits reported yet.".to_string();
        }
        let formatter = TableFormatter::new();
        let mut out = formatter.format_commits(&self.commits);
        for commit in self.commits.iter().filter(|c| !c.tasks.is_empty()) {
            out.push_str(&format!("\n\nTasks of {} ({})\n", commit.short_sha, commit.headline));
            out.push_str(&formatter.format_tasks(&commit.tasks));
        }
        let total: usize = self.totals.values().sum();
        out.push_str(&format!(
            "\n{} task(s) across {} commit(s), {} image pool(s)",
            total,
            self.commits.len(),
            self.images.len()
        ));
        if self.stale_nodes > 0 {
            out.push_str(&format!(", {} stale node(s)", self.stale_nodes));
        }
        out
    }
}
