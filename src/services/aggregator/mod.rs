//! The status-aggregation tree.
//!
//! Every position in the tree is an independent tokio task (a *node*) that
//! owns its children. A node polls its upstream through one
//! [`NodeAdapter`](crate::domain::ports::NodeAdapter), reconciles its child
//! set against the fetched entity ids, and recomputes its combined summary
//! from its own contribution plus the latest report of each child. Changed
//! summaries flow upward over channels; nodes never share mutable state.
//!
//! Teardown is hierarchical: each node's cancellation token is a child of
//! its parent's, so cancelling a node stops its whole subtree.

mod children;
mod node;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::domain::models::{NodeScope, Record, Summary};

pub use children::{ChildSet, Reconciliation};
pub use node::{spawn_node, NodeHandle, TreeContext};

/// Lifecycle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Waiting for the next tick.
    Idle,
    /// A fetch is in flight.
    Fetching,
    /// Applying a fresh batch.
    Merging,
    /// A fetch just failed; the previous data is still reported. The node
    /// returns to `Idle` once the failure is published.
    Stale,
    /// Torn down; no further reports.
    Destroyed,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Merging => "merging",
            Self::Stale => "stale",
            Self::Destroyed => "destroyed",
        }
    }
}

/// A node's state as published to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    /// Child ids from the root down to this node, inclusive.
    pub path: Vec<String>,
    /// Spawn sequence number of this node. A node re-created at the same
    /// path always has a higher one.
    pub instance: u64,
    pub parent_instance: Option<u64>,
    pub scope: NodeScope,
    pub state: NodeState,
    /// Records from the last successful fetch.
    pub records: Vec<Record>,
    /// Combined summary of this node and its subtree.
    pub summary: Summary,
    pub children: usize,
    /// Error of the last fetch, cleared by the next successful one.
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl NodeSnapshot {
    /// Whether the node's last fetch failed and it reports old data.
    pub fn is_stale(&self) -> bool {
        self.state == NodeState::Stale || self.last_error.is_some()
    }
}

/// A child's combined summary, tagged with the child instance that sent it.
#[derive(Debug, Clone)]
pub struct ChildReport {
    pub child_id: String,
    pub instance: u64,
    pub summary: Summary,
}

/// Where a node delivers its combined summary.
#[derive(Debug, Clone)]
pub enum ReportSink {
    /// The tree root publishes to the dashboard's watch channel.
    Root(watch::Sender<Summary>),
    /// Every other node reports to its parent.
    Parent {
        tx: mpsc::UnboundedSender<ChildReport>,
        child_id: String,
        instance: u64,
    },
}

impl ReportSink {
    /// Deliver `summary`. Returns `false` if nobody is listening any more.
    pub fn deliver(&self, summary: &Summary) -> bool {
        match self {
            Self::Root(tx) => {
                tx.send_if_modified(|current| {
                    if current == summary {
                        false
                    } else {
                        *current = summary.clone();
                        true
                    }
                });
                !tx.is_closed()
            }
            Self::Parent {
                tx,
                child_id,
                instance,
            } => tx
                .send(ChildReport {
                    child_id: child_id.clone(),
                    instance: *instance,
                    summary: summary.clone(),
                })
                .is_ok(),
        }
    }
}
