//! Taskcluster queue HTTP client.
//!
//! Unlike the other upstreams, the queue's root URL is not configured: it
//! is taken from each status report's target URL, so every call carries it.

use reqwest::Url;

use crate::adapters::http::UpstreamClient;
use crate::domain::errors::{FetchError, FetchResult};

use super::models::{
    ArtifactPage, LaunchConfigDocument, QueueArtifact, TaskGroupEntry, TaskGroupPage,
    TaskStatus, TaskStatusResponse,
};

/// Upper bound on continuation pages followed for one listing.
const MAX_PAGES: usize = 100;

#[derive(Debug, Clone)]
pub struct TaskclusterClient {
    upstream: UpstreamClient,
}

impl TaskclusterClient {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self { upstream }
    }

    fn queue_url(root_url: &str, path: &str) -> String {
        format!("{}/api/queue/v1/{}", root_url.trim_end_matches('/'), path)
    }

    fn with_continuation(url: &str, token: Option<&str>) -> FetchResult<String> {
        let Some(token) = token else {
            return Ok(url.to_string());
        };
        let mut parsed =
            Url::parse(url).map_err(|e| FetchError::InvalidTarget(format!("{url}: {e}")))?;
        parsed
            .query_pairs_mut()
            .append_pair("continuationToken", token);
        Ok(parsed.into())
    }

    /// Every task of a group, following continuation tokens.
    pub async fn list_task_group(
        &self,
        root_url: &str,
        group_id: &str,
    ) -> FetchResult<Vec<TaskGroupEntry>> {
        let base = Self::queue_url(root_url, &format!("task-group/{group_id}/list"));
        let mut tasks = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let url = Self::with_continuation(&base, token.as_deref())?;
            let page: TaskGroupPage = self.upstream.get_json(&url).await?;
            tasks.extend(page.tasks);
            match page.continuation_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(tasks),
            }
        }

        tracing::warn!(group_id, pages = MAX_PAGES, "task group listing truncated");
        Ok(tasks)
    }

    pub async fn task_status(&self, root_url: &str, task_id: &str) -> FetchResult<TaskStatus> {
        let url = Self::queue_url(root_url, &format!("task/{task_id}/status"));
        let response: TaskStatusResponse = self.upstream.get_json(&url).await?;
        Ok(response.status)
    }

    /// Every artifact of one run, following continuation tokens.
    pub async fn list_artifacts(
        &self,
        root_url: &str,
        task_id: &str,
        run_id: u32,
    ) -> FetchResult<Vec<QueueArtifact>> {
        let base = Self::queue_url(root_url, &format!("task/{task_id}/runs/{run_id}/artifacts"));
        let mut artifacts = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let url = Self::with_continuation(&base, token.as_deref())?;
            let page: ArtifactPage = self.upstream.get_json(&url).await?;
            artifacts.extend(page.artifacts);
            match page.continuation_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(artifacts),
            }
        }

        tracing::warn!(task_id, run_id, pages = MAX_PAGES, "artifact listing truncated");
        Ok(artifacts)
    }

    pub async fn launch_configs(
        &self,
        root_url: &str,
        task_id: &str,
        run_id: u32,
        name: &str,
    ) -> FetchResult<LaunchConfigDocument> {
        let url = Self::queue_url(
            root_url,
            &format!("task/{task_id}/runs/{run_id}/artifacts/{name}"),
        );
        self.upstream.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_url() {
        assert_eq!(
            TaskclusterClient::queue_url("https://tc.example.com/", "task/abc/status"),
            "https://tc.example.com/api/queue/v1/task/abc/status"
        );
    }

    #[test]
    fn test_continuation_is_query_encoded() {
        let url = TaskclusterClient::with_continuation(
            "https://tc.example.com/api/queue/v1/task-group/g/list",
            Some("a b&c"),
        )
        .unwrap();
        assert_eq!(
            url,
            "https://tc.example.com/api/queue/v1/task-group/g/list?continuationToken=a+b%26c"
        );
        let url = TaskclusterClient::with_continuation("https://x/list", None).unwrap();
        assert_eq!(url, "https://x/list");
    }
}
