//! Build-matrix adapter.
//!
//! Each job of a build becomes a [`JobRecord`] and contributes its id to
//! the node's local summary under the state its result code maps to.

use async_trait::async_trait;

use crate::adapters::http::UpstreamClient;
use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{
    JobRecord, NodeScope, NormalizedBatch, Record, Summary, TravisConfig, UpstreamKind,
};
use crate::domain::ports::NodeAdapter;

use super::models::TravisBuild;

#[derive(Debug)]
pub struct BuildMatrixAdapter {
    upstream: UpstreamClient,
    api_base: String,
    repo_slug: String,
}

impl BuildMatrixAdapter {
    pub fn new(upstream: UpstreamClient, config: &TravisConfig) -> Self {
        Self {
            upstream,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo_slug: config.repo_slug.clone(),
        }
    }

    fn build_url(&self, build_id: u64) -> String {
        format!("{}/repos/{}/builds/{}", self.api_base, self.repo_slug, build_id)
    }

    pub fn normalize(build: &TravisBuild) -> NormalizedBatch {
        let jobs: Vec<JobRecord> = build.matrix.iter().map(JobRecord::from).collect();
        let local = Summary::from_jobs(&jobs);
        NormalizedBatch::new()
            .with_records(jobs.into_iter().map(Record::Job).collect())
            .with_local(local)
    }
}

#[async_trait]
impl NodeAdapter for BuildMatrixAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::BuildMatrix
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let NodeScope::Build { build_id } = scope else {
            return Err(FetchError::InvalidTarget(format!(
                "build matrix cannot serve {scope}"
            )));
        };
        let build: TravisBuild = self.upstream.get_json(&self.build_url(*build_id)).await?;
        Ok(Self::normalize(&build))
    }
}
