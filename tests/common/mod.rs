//! Common test utilities for integration tests
//!
//! Provides a scripted in-memory adapter for driving the aggregation tree
//! without a network, plus helpers for waiting on its output.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pipewatch::domain::models::{NodeScope, NormalizedBatch, Summary, TaskState, UpstreamKind};
use pipewatch::services::NodeSnapshot;
use pipewatch::{FetchError, FetchResult, NodeAdapter};
use tokio::sync::{broadcast, watch};

/// Root URL used by scripted task scopes.
#[allow(dead_code)]
pub const ROOT_URL: &str = "https://tc.test";

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 20ms until it returns true or `timeout_ms`
/// elapses.
#[allow(dead_code)]
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    predicate()
}

/// Wait until the root summary satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for_summary<F>(
    rx: &mut watch::Receiver<Summary>,
    predicate: F,
    timeout_ms: u64,
) -> Option<Summary>
where
    F: FnMut(&Summary) -> bool,
{
    tokio::time::timeout(Duration::from_millis(timeout_ms), rx.wait_for(predicate))
        .await
        .ok()?
        .ok()
        .map(|summary| Summary::clone(&summary))
}

/// Receive snapshots until one for `path` satisfies `predicate`.
#[allow(dead_code)]
pub async fn wait_for_node<F>(
    rx: &mut broadcast::Receiver<NodeSnapshot>,
    path: &[&str],
    mut predicate: F,
    timeout_ms: u64,
) -> Option<NodeSnapshot>
where
    F: FnMut(&NodeSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let snapshot = match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
        };
        if snapshot.path == path && predicate(&snapshot) {
            return Some(snapshot);
        }
    }
}

/// Discard every snapshot already buffered in `rx`.
#[allow(dead_code)]
pub fn drain(rx: &mut broadcast::Receiver<NodeSnapshot>) {
    while rx.try_recv().is_ok() {}
}

/// Summary holding `tasks` with no resolution times.
#[allow(dead_code)]
pub fn summary_of(tasks: &[(&str, TaskState)]) -> Summary {
    let mut summary = Summary::new();
    for (id, state) in tasks {
        summary.record_task(*id, *state, None);
    }
    summary
}

#[allow(dead_code)]
pub fn task_scope(task_id: &str) -> NodeScope {
    NodeScope::Task {
        root_url: ROOT_URL.to_string(),
        task_id: task_id.to_string(),
    }
}

#[allow(dead_code)]
pub fn group_scope(group_id: &str) -> NodeScope {
    NodeScope::TaskGroup {
        root_url: ROOT_URL.to_string(),
        group_id: group_id.to_string(),
    }
}

/// In-memory adapter whose responses are set per scope id.
///
/// Every fetch is counted, and can be slowed down to exercise timeouts
/// and tick coalescing. Scopes with no scripted response fetch an empty
/// batch.
#[derive(Clone)]
pub struct ScriptedAdapter {
    kind: UpstreamKind,
    responses: Arc<Mutex<HashMap<String, FetchResult<NormalizedBatch>>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    delay: Arc<Mutex<Duration>>,
}

#[allow(dead_code)]
impl ScriptedAdapter {
    pub fn new(kind: UpstreamKind) -> Self {
        Self {
            kind,
            responses: Arc::default(),
            calls: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
            delay: Arc::default(),
        }
    }

    pub fn respond(&self, scope_id: &str, result: FetchResult<NormalizedBatch>) {
        self.responses
            .lock()
            .unwrap()
            .insert(scope_id.to_string(), result);
    }

    pub fn succeed(&self, scope_id: &str, batch: NormalizedBatch) {
        self.respond(scope_id, Ok(batch));
    }

    pub fn fail(&self, scope_id: &str) {
        self.respond(
            scope_id,
            Err(FetchError::Network {
                url: format!("{}/{scope_id}", ROOT_URL),
                cause: "connection refused".to_string(),
            }),
        );
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self, scope_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(scope_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of concurrent fetches observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeAdapter for ScriptedAdapter {
    fn kind(&self) -> UpstreamKind {
        self.kind
    }

    async fn fetch(&self, scope: &NodeScope) -> FetchResult<NormalizedBatch> {
        let id = scope.id();
        *self.calls.lock().unwrap().entry(id.clone()).or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Ok(NormalizedBatch::new()))
    }
}
