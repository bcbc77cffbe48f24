//! Run-artifacts adapter.
//!
//! Lists a run's artifacts, classifies them, and reads the first public
//! JSON artifact as a launch-configuration document. Image references in
//! that document are parsed into pool-keyed image counts; references that
//! do not match the image naming pattern are logged and skipped.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::artifact::launch_config;
use crate::domain::models::image::extract_images;
use crate::domain::models::{ArtifactRecord, NodeScope, NormalizedBatch, Record, UpstreamKind};
use crate::domain::ports::NodeAdapter;

use super::client::TaskclusterClient;
use super::models::{LaunchConfigDocument, QueueArtifact};

#[derive(Debug)]
pub struct RunArtifactsAdapter {
    client: Arc<TaskclusterClient>,
}

impl RunArtifactsAdapter {
    pub fn new(client: Arc<TaskclusterClient>) -> Self {
        Self { client }
    }

    pub fn artifact_records(
        task_id: &str,
        run_id: u32,
        artifacts: &[QueueArtifact],
    ) -> Vec<ArtifactRecord> {
        artifacts
            .iter()
            .map(|a| ArtifactRecord::new(task_id, run_id, &a.name, &a.content_type))
            .collect()
    }

    /// Combine the artifact list with the (optional) launch-config document.
    pub fn normalize(
        artifacts: Vec<ArtifactRecord>,
        launch_configs: Option<&LaunchConfigDocument>,
    ) -> NormalizedBatch {
        let extraction = extract_images(launch_configs.into_iter().flat_map(|d| d.image_ids()));
        for rejected in &extraction.rejected {
            tracing::warn!(error = %rejected, "skipping unrecognized image reference");
        }

        let local = extraction.summary();
        let mut records: Vec<Record> = artifacts.into_iter().map(Record::Artifact).collect();
        records.extend(extraction.images.into_iter().map(Record::Image));

        NormalizedBatch::new().with_records(records).with_local(local)
    }
}

#[async_trait]
impl NodeAdapter for RunArtifactsAdapter {
    fn kind(&self) -> UpstreamKind {
        UpstreamKind::RunArtifacts
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let NodeScope::Run {
            root_url,
            task_id,
            run_id,
        } = scope
        else {
            return Err(FetchError::InvalidTarget(format!(
                "run artifacts cannot serve {scope}"
            )));
        };

        let listing = self.client.list_artifacts(root_url, task_id, *run_id).await?;
        let artifacts = Self::artifact_records(task_id, *run_id, &listing);

        let document = match launch_config(&artifacts) {
            Some(artifact) => Some(
                self.client
                    .launch_configs(root_url, task_id, *run_id, &artifact.name)
                    .await?,
            ),
            None => None,
        };

        Ok(Self::normalize(artifacts, document.as_ref()))
    }
}
