//! Implementation of the `pipewatch snapshot` command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::Args;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cli::output::{output, DashboardReport};
use crate::domain::models::Config;
use crate::services::{Dashboard, DashboardView, ManualScheduler, NodeSnapshot};

use super::with_limit;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Number of recent commits to expand (overrides poll.commit_limit)
    #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,

    /// Seconds to let the tree expand before printing
    #[arg(long, default_value = "15")]
    pub settle_secs: u64,

    /// List each commit's Taskcluster tasks with their run states
    #[arg(long)]
    pub tasks: bool,

    /// Only list tasks whose name starts with this two-digit stage (implies --tasks)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..100))]
    pub stage: Option<u8>,
}

pub async fn execute(args: SnapshotArgs, config: Config, json_mode: bool) -> Result<()> {
    let config = with_limit(config, args.limit);

    let mut dashboard = Dashboard::from_config(&config, Arc::new(ManualScheduler::new()))
        .context("Failed to build upstream clients")?;
    let mut snapshots = dashboard.subscribe();
    dashboard.start();

    info!(settle_secs = args.settle_secs, "Collecting snapshot");
    let view = collect(&mut snapshots, Duration::from_secs(args.settle_secs)).await;

    let summary = dashboard.current();
    dashboard.shutdown().await;

    let mut report = DashboardReport::new(&view, &summary);
    if args.tasks || args.stage.is_some() {
        report = report.with_tasks(&view, args.stage);
    }
    output(&report, json_mode);
    Ok(())
}

/// Fold snapshots into a view until `settle` elapses or Ctrl-C.
pub async fn collect(
    snapshots: &mut broadcast::Receiver<NodeSnapshot>,
    settle: Duration,
) -> DashboardView {
    let mut view = DashboardView::new();
    let deadline = tokio::time::sleep(settle);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            msg = snapshots.recv() => match msg {
                Ok(snapshot) => view.apply(snapshot),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Snapshot receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    view
}
