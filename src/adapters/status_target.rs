//! Status target dispatch.
//!
//! A status report names the CI run that produced it through its target
//! URL. This adapter performs no I/O: it decides, from the status context,
//! whether that run is a build matrix or a task group, and parses the
//! identifiers out of the URL.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Url;

use crate::adapters::http::{last_path_segment, origin};
use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{NodeScope, NormalizedBatch, TravisConfig, UpstreamKind};
use crate::domain::ports::NodeAdapter;

#[derive(Debug, Clone)]
pub struct StatusTargetAdapter {
    build_contexts: HashSet<String>,
}

impl StatusTargetAdapter {
    pub fn new(config: &TravisConfig) -> Self {
        Self {
            build_contexts: config.contexts.iter().cloned().collect(),
        }
    }

    /// The single child scope a status expands into.
    pub fn dispatch(&self, context: &str, target_url: &str) -> FetchResult<NodeScope> {
        let url = Url::parse(target_url)
            .map_err(|e| FetchError::InvalidTarget(format!("{target_url}: {e}")))?;
        let segment = last_path_segment(&url).ok_or_else(|| {
            FetchError::InvalidTarget(format!("{target_url}: no identifier in path"))
        })?;

        if self.build_contexts.contains(context) {
            let build_id = segment.parse::<u64>().map_err(|_| {
                FetchError::InvalidTarget(format!("{target_url}: build id {segment:?} is not numeric"))
            })?;
            return Ok(NodeScope::Build { build_id });
        }

        let root_url = origin(&url)
            .ok_or_else(|| FetchError::InvalidTarget(format!("{target_url}: no host")))?;
        Ok(NodeScope::TaskGroup {
            root_url,
            group_id: segment,
        })
    }
}

#[async_trait]
impl NodeAdapter for StatusTargetAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::StatusTarget
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let NodeScope::Status {
            context,
            target_url,
            ..
        } = scope
        else {
            return Err(FetchError::InvalidTarget(format!(
                "status target cannot serve {scope}"
            )));
        };
        let child = self.dispatch(context, target_url)?;
        Ok(NormalizedBatch::new().with_children(vec![child]))
    }
}
