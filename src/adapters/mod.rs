//! Upstream adapters.
//!
//! One sub-module per external CI system, plus the shared HTTP plumbing
//! and the [`AdapterSet`] that binds every tree level to its adapter.

pub mod github;
pub mod http;
pub mod status_target;
pub mod taskcluster;
pub mod travis;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::errors::FetchResult;
use crate::domain::models::{Config, NodeScope, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use self::github::{CommitListAdapter, GitHubClient, StatusListAdapter};
use self::http::UpstreamClient;
use self::status_target::StatusTargetAdapter;
use self::taskcluster::{RunArtifactsAdapter, TaskAdapter, TaskGroupAdapter, TaskclusterClient};
use self::travis::BuildMatrixAdapter;

/// Adapters indexed by the upstream kind they serve.
///
/// Nodes pick their adapter once, at creation, from their scope's
/// [`NodeScope::kind`].
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<UpstreamKind, Arc<dyn NodeAdapter>>,
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.adapters.keys().map(UpstreamKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("AdapterSet").field("kinds", &kinds).finish()
    }
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the production adapters for every tree level.
    pub fn from_config(config: &Config) -> FetchResult<Self> {
        let upstream = UpstreamClient::new(&config.rate_limit, &config.poll)?;

        let github = Arc::new(GitHubClient::new(upstream.clone(), &config.github));
        let taskcluster = Arc::new(TaskclusterClient::new(upstream.clone()));

        Ok(Self::new()
            .with(CommitListAdapter::new(
                Arc::clone(&github),
                config.poll.commit_limit,
            ))
            .with(StatusListAdapter::new(github))
            .with(StatusTargetAdapter::new(&config.travis))
            .with(BuildMatrixAdapter::new(upstream, &config.travis))
            .with(TaskGroupAdapter::new(Arc::clone(&taskcluster)))
            .with(TaskAdapter::new(Arc::clone(&taskcluster)))
            .with(RunArtifactsAdapter::new(taskcluster)))
    }

    /// Register `adapter` under its own kind, replacing any previous one.
    pub fn with(mut self, adapter: impl NodeAdapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn NodeAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// The adapter serving `scope`, if one is registered.
    pub fn for_scope(&self, scope: &NodeScope) -> Option<Arc<dyn NodeAdapter>> {
        self.adapters.get(&scope.kind()).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
