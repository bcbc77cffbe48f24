use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, OptionFuture};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::adapters::AdapterSet;
use crate::domain::errors::{FetchError, FetchResult};
use crate::domain::models::{NodeScope, NormalizedBatch, Record, Summary};
use crate::domain::ports::NodeAdapter;
use crate::services::scheduler::Scheduler;

use super::children::ChildSet;
use super::{ChildReport, NodeSnapshot, NodeState, ReportSink};

/// Everything shared by the nodes of one tree.
#[derive(Debug)]
pub struct TreeContext {
    adapters: AdapterSet,
    scheduler: Arc<dyn Scheduler>,
    fetch_timeout: Duration,
    snapshots: broadcast::Sender<NodeSnapshot>,
    next_instance: AtomicU64,
}

impl TreeContext {
    pub fn new(
        adapters: AdapterSet,
        scheduler: Arc<dyn Scheduler>,
        fetch_timeout: Duration,
        snapshots: broadcast::Sender<NodeSnapshot>,
    ) -> Self {
        Self {
            adapters,
            scheduler,
            fetch_timeout,
            snapshots,
            next_instance: AtomicU64::new(1),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    fn next_instance(&self) -> u64 {
        self.next_instance.fetch_add(1, Ordering::Relaxed)
    }
}

/// Owner's handle on a running node.
#[derive(Debug)]
pub struct NodeHandle {
    scope: NodeScope,
    instance: u64,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl NodeHandle {
    pub(crate) fn new(
        scope: NodeScope,
        instance: u64,
        cancel: CancellationToken,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            scope,
            instance,
            cancel,
            join,
        }
    }

    pub fn scope(&self) -> &NodeScope {
        &self.scope
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Stop this node and its whole subtree.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the node task to exit.
    pub async fn join(self) {
        if let Err(err) = self.join.await {
            if err.is_panic() {
                tracing::error!(node = %self.scope, "Node task panicked");
            }
        }
    }
}

/// Spawn a tree rooted at `scope`, publishing its combined summary to `sink`.
pub fn spawn_node(
    ctx: Arc<TreeContext>,
    scope: NodeScope,
    sink: watch::Sender<Summary>,
    cancel: CancellationToken,
) -> NodeHandle {
    let path = vec![scope.id()];
    spawn(ctx, scope, path, None, |_| ReportSink::Root(sink), cancel)
}

fn spawn(
    ctx: Arc<TreeContext>,
    scope: NodeScope,
    path: Vec<String>,
    parent_instance: Option<u64>,
    sink: impl FnOnce(u64) -> ReportSink,
    cancel: CancellationToken,
) -> NodeHandle {
    let instance = ctx.next_instance();
    let lineage = Lineage {
        path,
        instance,
        parent_instance,
    };
    let node = Node::new(ctx, scope.clone(), lineage, sink(instance), cancel.clone());
    let join = tokio::spawn(node.run());
    NodeHandle::new(scope, instance, cancel, join)
}

fn spawn_child(
    ctx: &Arc<TreeContext>,
    scope: NodeScope,
    parent: &Lineage,
    reports: &mpsc::UnboundedSender<ChildReport>,
    parent_cancel: &CancellationToken,
) -> NodeHandle {
    let child_id = scope.id();
    let mut path = parent.path.clone();
    path.push(child_id.clone());
    let tx = reports.clone();
    spawn(
        Arc::clone(ctx),
        scope,
        path,
        Some(parent.instance),
        move |instance| ReportSink::Parent {
            tx,
            child_id,
            instance,
        },
        parent_cancel.child_token(),
    )
}

/// Where a node sits in the tree.
#[derive(Debug, Clone)]
struct Lineage {
    path: Vec<String>,
    instance: u64,
    parent_instance: Option<u64>,
}

struct Node {
    ctx: Arc<TreeContext>,
    scope: NodeScope,
    lineage: Lineage,
    adapter: Option<Arc<dyn NodeAdapter>>,
    sink: ReportSink,
    cancel: CancellationToken,
    state: NodeState,
    local: Summary,
    records: Vec<Record>,
    children: ChildSet,
    reports_tx: mpsc::UnboundedSender<ChildReport>,
    reports_rx: mpsc::UnboundedReceiver<ChildReport>,
    last_reported: Option<Summary>,
    last_error: Option<String>,
}

impl Node {
    fn new(
        ctx: Arc<TreeContext>,
        scope: NodeScope,
        lineage: Lineage,
        sink: ReportSink,
        cancel: CancellationToken,
    ) -> Self {
        let adapter = ctx.adapters.for_scope(&scope);
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            ctx,
            scope,
            lineage,
            adapter,
            sink,
            cancel,
            state: NodeState::Idle,
            local: Summary::new(),
            records: Vec::new(),
            children: ChildSet::new(),
            reports_tx,
            reports_rx,
            last_reported: None,
            last_error: None,
        }
    }

    async fn run(mut self) {
        let mut timer = self.ctx.scheduler.timer(&self.scope);
        let mut timer_live = true;
        let mut in_flight: Option<BoxFuture<'static, FetchResult<NormalizedBatch>>> = None;

        debug!(node = %self.scope, "Node mounted");

        loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                Some(result) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    self.apply(result);
                }

                Some(report) = self.reports_rx.recv() => {
                    if self.children.accept(report) {
                        self.publish();
                    }
                }

                tick = timer.tick(), if timer_live => match tick {
                    Some(()) if in_flight.is_some() => {
                        trace!(node = %self.scope, "Tick coalesced into in-flight fetch");
                    }
                    Some(()) => {
                        self.state = NodeState::Fetching;
                        in_flight = Some(self.start_fetch());
                    }
                    None => timer_live = false,
                },
            }
        }

        drop(in_flight);
        self.teardown().await;
    }

    fn start_fetch(&self) -> BoxFuture<'static, FetchResult<NormalizedBatch>> {
        let adapter = self.adapter.clone();
        let scope = self.scope.clone();
        let limit = self.ctx.fetch_timeout;
        async move {
            let Some(adapter) = adapter else {
                return Err(FetchError::InvalidTarget(format!(
                    "no adapter registered for {}",
                    scope.kind().as_str()
                )));
            };
            match tokio::time::timeout(limit, adapter.fetch(&scope)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit)),
            }
        }
        .boxed()
    }

    fn apply(&mut self, result: FetchResult<NormalizedBatch>) {
        match result {
            Ok(batch) => {
                self.state = NodeState::Merging;
                self.local = batch.local;
                self.records = batch.records;
                self.last_error = None;
                self.reconcile(batch.children);
                self.state = NodeState::Idle;
                self.publish();
            }
            Err(err) => {
                warn!(
                    node = %self.scope,
                    kind = err.kind(),
                    error = %err,
                    "Fetch failed, keeping previous data"
                );
                self.state = NodeState::Stale;
                self.last_error = Some(err.to_string());
                let summary = self.children.combined(&self.local);
                self.snapshot(summary);
                self.state = NodeState::Idle;
            }
        }
    }

    fn reconcile(&mut self, desired: Vec<NodeScope>) {
        let ctx = Arc::clone(&self.ctx);
        let tx = self.reports_tx.clone();
        let cancel = self.cancel.clone();
        let lineage = self.lineage.clone();

        let outcome = self
            .children
            .reconcile(desired, |scope| spawn_child(&ctx, scope, &lineage, &tx, &cancel));

        if !outcome.is_noop() {
            debug!(
                node = %self.scope,
                created = outcome.created.len(),
                destroyed = outcome.destroyed.len(),
                kept = outcome.kept,
                "Reconciled children"
            );
        }
    }

    /// Recompute the combined summary and report it upward if it changed.
    fn publish(&mut self) {
        let combined = self.children.combined(&self.local);
        if self.last_reported.as_ref() != Some(&combined) {
            if matches!(self.sink, ReportSink::Root(_)) {
                info!(
                    node = %self.scope,
                    tasks = combined.total(),
                    pools = combined.images().len(),
                    "Summary updated"
                );
            }
            if !self.sink.deliver(&combined) {
                trace!(node = %self.scope, "Report receiver is gone");
            }
            self.last_reported = Some(combined.clone());
        }
        self.snapshot(combined);
    }

    fn snapshot(&self, summary: Summary) {
        let _ = self.ctx.snapshots.send(NodeSnapshot {
            path: self.lineage.path.clone(),
            instance: self.lineage.instance,
            parent_instance: self.lineage.parent_instance,
            scope: self.scope.clone(),
            state: self.state,
            records: self.records.clone(),
            summary,
            children: self.children.len(),
            last_error: self.last_error.clone(),
            updated_at: Utc::now(),
        });
    }

    async fn teardown(&mut self) {
        self.state = NodeState::Destroyed;
        self.children.shutdown().await;
        self.snapshot(self.last_reported.clone().unwrap_or_default());
        debug!(node = %self.scope, "Node destroyed");
    }
}
