use std::collections::BTreeMap;

use futures::future::join_all;

use crate::domain::models::{NodeScope, Summary};

use super::node::NodeHandle;
use super::ChildReport;

/// Outcome of reconciling a child set against a fresh entity list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: Vec<String>,
    pub destroyed: Vec<String>,
    pub kept: usize,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty()
    }
}

/// A node's live children and the latest summary each has reported.
#[derive(Debug, Default)]
pub struct ChildSet {
    handles: BTreeMap<String, NodeHandle>,
    reports: BTreeMap<String, Summary>,
}

impl ChildSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handles.keys().map(String::as_str)
    }

    /// Bring the child set in line with `desired`, keyed by [`NodeScope::id`].
    ///
    /// Ids not yet present are created through `spawn`; ids no longer
    /// present are cancelled and their last report is discarded; ids present
    /// on both sides are left running untouched. Duplicate ids in `desired`
    /// keep their first occurrence.
    pub fn reconcile<F>(&mut self, desired: Vec<NodeScope>, mut spawn: F) -> Reconciliation
    where
        F: FnMut(NodeScope) -> NodeHandle,
    {
        let mut wanted: BTreeMap<String, NodeScope> = BTreeMap::new();
        for scope in desired {
            wanted.entry(scope.id()).or_insert(scope);
        }

        let mut outcome = Reconciliation::default();

        let stale: Vec<String> = self
            .handles
            .keys()
            .filter(|id| !wanted.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(handle) = self.handles.remove(&id) {
                handle.cancel();
            }
            self.reports.remove(&id);
            outcome.destroyed.push(id);
        }

        for (id, scope) in wanted {
            if self.handles.contains_key(&id) {
                outcome.kept += 1;
                continue;
            }
            self.handles.insert(id.clone(), spawn(scope));
            outcome.created.push(id);
        }

        outcome
    }

    /// Record a child's report.
    ///
    /// Reports from a child that is no longer in the set, or from an earlier
    /// instance of a re-created child, are dropped. Returns `true` when the
    /// stored report actually changed.
    pub fn accept(&mut self, report: ChildReport) -> bool {
        let current = self
            .handles
            .get(&report.child_id)
            .is_some_and(|h| h.instance() == report.instance);
        if !current {
            tracing::trace!(
                child = %report.child_id,
                instance = report.instance,
                "Dropping report from destroyed child"
            );
            return false;
        }

        if self.reports.get(&report.child_id) == Some(&report.summary) {
            return false;
        }
        let was_empty = !self.reports.contains_key(&report.child_id);
        let is_empty = report.summary.is_empty();
        self.reports.insert(report.child_id, report.summary);
        !(was_empty && is_empty)
    }

    /// `local` merged with every child's last report.
    pub fn combined(&self, local: &Summary) -> Summary {
        Summary::merge_all(std::iter::once(local).chain(self.reports.values()))
    }

    /// Cancel every child and wait for their tasks to finish.
    pub async fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        self.reports.clear();
        for handle in handles.values() {
            handle.cancel();
        }
        join_all(handles.into_values().map(NodeHandle::join)).await;
    }
}
