//! Dashboard service: owns the root of the aggregation tree.
//!
//! The dashboard exposes two read-only surfaces to the presentation layer:
//! a `watch` channel holding the root's combined summary, and a `broadcast`
//! of per-node snapshots. [`DashboardView`] folds those snapshots into the
//! per-commit rows the CLI renders.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::AdapterSet;
use crate::domain::errors::FetchResult;
use crate::domain::models::task_state::{display_order, run_badges};
use crate::domain::models::{
    CommitRecord, Config, NodeScope, Record, RunRecord, Summary, TaskRecord, TaskState,
};
use crate::services::aggregator::{spawn_node, NodeHandle, NodeSnapshot, NodeState, TreeContext};
use crate::services::scheduler::Scheduler;

const SNAPSHOT_CAPACITY: usize = 1024;

/// A running (or ready to run) aggregation tree.
#[derive(Debug)]
pub struct Dashboard {
    ctx: Arc<TreeContext>,
    root_scope: NodeScope,
    snapshots: broadcast::Sender<NodeSnapshot>,
    summary_tx: Option<watch::Sender<Summary>>,
    summary_rx: watch::Receiver<Summary>,
    cancel: CancellationToken,
    root: Option<NodeHandle>,
}

impl Dashboard {
    /// Build a dashboard over `adapters`. Nothing runs until [`start`].
    ///
    /// [`start`]: Dashboard::start
    pub fn new(adapters: AdapterSet, scheduler: Arc<dyn Scheduler>, fetch_timeout: Duration) -> Self {
        let (snapshots, _) = broadcast::channel(SNAPSHOT_CAPACITY);
        let (summary_tx, summary_rx) = watch::channel(Summary::new());
        let ctx = Arc::new(TreeContext::new(
            adapters,
            scheduler,
            fetch_timeout,
            snapshots.clone(),
        ));
        Self {
            ctx,
            root_scope: NodeScope::Dashboard,
            snapshots,
            summary_tx: Some(summary_tx),
            summary_rx,
            cancel: CancellationToken::new(),
            root: None,
        }
    }

    /// Production wiring from configuration.
    pub fn from_config(config: &Config, scheduler: Arc<dyn Scheduler>) -> FetchResult<Self> {
        let adapters = AdapterSet::from_config(config)?;
        Ok(Self::new(adapters, scheduler, config.poll.fetch_timeout()))
    }

    /// Root the tree at a scope other than the commit list.
    pub fn with_root(mut self, scope: NodeScope) -> Self {
        self.root_scope = scope;
        self
    }

    /// Subscribe to node snapshots. Subscribe before [`Dashboard::start`]
    /// to observe the first fetches.
    pub fn subscribe(&self) -> broadcast::Receiver<NodeSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn summary(&self) -> watch::Receiver<Summary> {
        self.summary_rx.clone()
    }

    pub fn current(&self) -> Summary {
        self.summary_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.root.as_ref().is_some_and(|root| !root.is_finished())
    }

    /// Mount the root node. Calling it again is a no-op.
    pub fn start(&mut self) {
        let Some(sink) = self.summary_tx.take() else {
            return;
        };
        info!(root = %self.root_scope, "Starting dashboard");
        self.root = Some(spawn_node(
            Arc::clone(&self.ctx),
            self.root_scope.clone(),
            sink,
            self.cancel.child_token(),
        ));
    }

    /// Tear down the whole tree and wait for every node to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(root) = self.root.take() {
            root.join().await;
        }
        info!("Dashboard stopped");
    }
}

/// One rendered row: a watched commit and its rolled-up summary.
#[derive(Debug, Clone)]
pub struct CommitRow {
    pub commit: CommitRecord,
    pub summary: Summary,
    /// Lifecycle of the commit node, if it has reported yet.
    pub state: Option<NodeState>,
    /// Nodes under this commit whose last fetch failed.
    pub stale: usize,
}

/// One task of a commit's task groups, with a badge per run state.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: TaskRecord,
    /// Counts over every run of the task, retries included.
    pub runs: BTreeMap<TaskState, usize>,
}

/// Latest snapshot of every live node, keyed by tree path.
#[derive(Debug, Default)]
pub struct DashboardView {
    nodes: BTreeMap<Vec<String>, NodeSnapshot>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one snapshot in.
    ///
    /// Snapshots from a node that has since been re-created at the same
    /// path are ignored. A destroyed node removes itself and the
    /// descendants it spawned, but not a newer node at its path.
    pub fn apply(&mut self, snapshot: NodeSnapshot) {
        if self
            .nodes
            .get(&snapshot.path)
            .is_some_and(|current| current.instance > snapshot.instance)
        {
            return;
        }
        if snapshot.state == NodeState::Destroyed {
            self.remove_subtree(&snapshot.path, snapshot.instance);
        } else {
            self.nodes.insert(snapshot.path.clone(), snapshot);
        }
    }

    fn remove_subtree(&mut self, path: &[String], instance: u64) {
        if self.nodes.get(path).is_some_and(|n| n.instance == instance) {
            self.nodes.remove(path);
        }
        let children: Vec<(Vec<String>, u64)> = self
            .nodes
            .iter()
            .filter(|(p, n)| {
                p.len() == path.len() + 1
                    && p.starts_with(path)
                    && n.parent_instance == Some(instance)
            })
            .map(|(p, n)| (p.clone(), n.instance))
            .collect();
        for (child, child_instance) in children {
            self.remove_subtree(&child, child_instance);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, path: &[String]) -> Option<&NodeSnapshot> {
        self.nodes.get(path)
    }

    pub fn root(&self) -> Option<&NodeSnapshot> {
        self.nodes.values().find(|s| s.path.len() == 1)
    }

    pub fn stale_count(&self) -> usize {
        self.nodes.values().filter(|s| s.is_stale()).count()
    }

    /// Tasks from every task group under commit `sha`, in display order.
    ///
    /// With `stage` set, only tasks whose name carries that two-digit stage
    /// prefix are listed. Run badges come from the task's own node and are
    /// empty until it has reported.
    pub fn tasks(&self, sha: &str, stage: Option<u8>) -> Vec<TaskRow> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        let mut commit_path = root.path.clone();
        commit_path.push(sha.to_string());

        let mut rows = Vec::new();
        for (path, node) in self.nodes.range(commit_path.clone()..) {
            if !path.starts_with(&commit_path) {
                break;
            }
            if !matches!(node.scope, NodeScope::TaskGroup { .. }) {
                continue;
            }
            for record in &node.records {
                let Record::Task(task) = record else {
                    continue;
                };
                if stage.is_some() && task.category() != stage {
                    continue;
                }
                let mut task_path = path.clone();
                task_path.push(task.id.clone());
                rows.push(TaskRow {
                    runs: run_badges(&self.runs(&task_path)),
                    task: task.clone(),
                });
            }
        }
        rows.sort_by(|a, b| display_order(&a.task, &b.task));
        rows
    }

    fn runs(&self, task_path: &[String]) -> Vec<RunRecord> {
        self.nodes
            .get(task_path)
            .map(|node| {
                node.records
                    .iter()
                    .filter_map(|record| match record {
                        Record::Run(run) => Some(run.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One row per commit the root lists, in upstream order.
    pub fn commits(&self) -> Vec<CommitRow> {
        let Some(root) = self.root() else {
            return Vec::new();
        };
        root.records
            .iter()
            .filter_map(|record| match record {
                Record::Commit(commit) => Some(commit),
                _ => None,
            })
            .map(|commit| {
                let mut path = root.path.clone();
                path.push(commit.sha.clone());
                let node = self.nodes.get(&path);
                let stale = self
                    .nodes
                    .iter()
                    .filter(|(p, s)| p.starts_with(&path) && s.is_stale())
                    .count();
                CommitRow {
                    commit: commit.clone(),
                    summary: node.map(|n| n.summary.clone()).unwrap_or_default(),
                    state: node.map(|n| n.state),
                    stale,
                }
            })
            .collect()
    }
}
