//! Per-scope rollup of task states and image deployments.
//!
//! A [`Summary`] counts by *cardinality of keys*: the same task id observed
//! twice is still one task. That is what lets a parent re-merge its
//! children's latest reports on every change without double counting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task_state::{JobRecord, TaskRecord, TaskState};

/// Task id → resolution time (`None` while unresolved).
pub type StateMap = BTreeMap<String, Option<DateTime<Utc>>>;

/// Aggregate of task states and image counts for one scope.
///
/// Empty per-state maps are never stored, so two summaries holding the
/// same tasks compare equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    by_state: BTreeMap<TaskState, StateMap>,
    images: BTreeMap<String, u64>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a summary from task records. A later record for the same id
    /// replaces an earlier one, so each id lands in exactly one state.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a TaskRecord>) -> Self {
        let mut summary = Self::new();
        for task in tasks {
            summary.record_task(&task.id, task.state, task.resolved_at);
        }
        summary
    }

    /// Build a summary from build-matrix jobs.
    pub fn from_jobs<'a>(jobs: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let mut summary = Self::new();
        for job in jobs {
            summary.record_task(&job.id, job.state, job.resolved_at);
        }
        summary
    }

    /// Record `id` in `state`, removing it from any other state first.
    pub fn record_task(
        &mut self,
        id: impl Into<String>,
        state: TaskState,
        resolved_at: Option<DateTime<Utc>>,
    ) {
        let id = id.into();
        self.by_state.retain(|s, tasks| {
            if *s != state {
                tasks.remove(&id);
            }
            !tasks.is_empty()
        });
        self.by_state
            .entry(state)
            .or_default()
            .insert(id, resolved_at);
    }

    /// Add `count` deployments of the image keyed by `key`.
    pub fn add_image(&mut self, key: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self.images.entry(key.into()).or_insert(0) += count;
    }

    /// Combine two summaries; `other` is the newer one.
    ///
    /// Task ids are unioned. An id present on both sides takes `other`'s
    /// state and resolution time and leaves every other state of `self`, so
    /// it is still counted once. Image counts are summed per key. Callers
    /// own replacing their previous contribution before merging, because
    /// the image sum is not idempotent on its own.
    #[must_use]
    pub fn merge(&self, other: &Summary) -> Summary {
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }

    /// In-place form of [`merge`](Self::merge).
    pub fn absorb(&mut self, other: &Summary) {
        for (state, tasks) in &other.by_state {
            for (id, resolved_at) in tasks {
                self.record_task(id.clone(), *state, *resolved_at);
            }
        }
        for (key, count) in &other.images {
            *self.images.entry(key.clone()).or_insert(0) += count;
        }
    }

    /// Fold any number of summaries, in order, onto an empty one.
    pub fn merge_all<'a>(summaries: impl IntoIterator<Item = &'a Summary>) -> Summary {
        let mut merged = Summary::new();
        for summary in summaries {
            merged.absorb(summary);
        }
        merged
    }

    /// Tasks currently in `state`.
    pub fn by_state(&self, state: TaskState) -> Option<&StateMap> {
        self.by_state.get(&state)
    }

    /// Number of distinct task ids in `state`.
    pub fn count(&self, state: TaskState) -> usize {
        self.by_state.get(&state).map_or(0, BTreeMap::len)
    }

    /// Number of task ids across all states.
    pub fn total(&self) -> usize {
        self.by_state.values().map(BTreeMap::len).sum()
    }

    /// Per-state counts for every state, in display order, including zeros.
    pub fn counts(&self) -> Vec<(TaskState, usize)> {
        TaskState::ALL
            .iter()
            .map(|state| (*state, self.count(*state)))
            .collect()
    }

    pub fn image_count(&self, key: &str) -> u64 {
        self.images.get(key).copied().unwrap_or(0)
    }

    pub fn images(&self) -> &BTreeMap<String, u64> {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.by_state.is_empty() && self.images.is_empty()
    }

    /// The state `id` is recorded under, if any.
    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.by_state
            .iter()
            .find(|(_, tasks)| tasks.contains_key(id))
            .map(|(state, _)| *state)
    }
}
