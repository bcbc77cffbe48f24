//! Implementation of the `pipewatch watch` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::Args;
use console::Term;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cli::output::{CommandOutput, DashboardReport};
use crate::domain::models::{Config, Summary};
use crate::services::{Dashboard, DashboardView, JitterScheduler, NodeSnapshot};

use super::with_limit;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Number of recent commits to watch (overrides poll.commit_limit)
    #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub limit: Option<usize>,
}

pub async fn execute(args: WatchArgs, config: Config, json_mode: bool) -> Result<()> {
    let config = with_limit(config, args.limit);
    let scheduler = Arc::new(JitterScheduler::from_config(&config.poll));

    let mut dashboard =
        Dashboard::from_config(&config, scheduler).context("Failed to build upstream clients")?;
    let mut snapshots = dashboard.subscribe();
    let mut summary = dashboard.summary();
    dashboard.start();

    info!(
        commits = config.poll.commit_limit,
        owner = %config.github.owner,
        repo = %config.github.repo,
        "Watching; press Ctrl-C to stop"
    );

    let term = Term::stdout();
    let mut view = DashboardView::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let render = tokio::select! {
            _ = &mut ctrl_c => break,
            changed = summary.changed() => {
                if changed.is_err() {
                    break;
                }
                drain(&mut snapshots, &mut view);
                true
            }
            msg = snapshots.recv() => match msg {
                Ok(snapshot) => {
                    let commit_list_changed = snapshot.path.len() == 1;
                    view.apply(snapshot);
                    commit_list_changed
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Snapshot receiver lagged");
                    false
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if render {
            let root = summary.borrow().clone();
            render_report(&term, &view, &root, json_mode);
        }
    }

    dashboard.shutdown().await;
    Ok(())
}

fn drain(snapshots: &mut broadcast::Receiver<NodeSnapshot>, view: &mut DashboardView) {
    loop {
        match snapshots.try_recv() {
            Ok(snapshot) => view.apply(snapshot),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

fn render_report(term: &Term, view: &DashboardView, root: &Summary, json_mode: bool) {
    let report = DashboardReport::new(view, root);
    if json_mode {
        println!("{}", report.to_json());
        return;
    }
    if term.is_term() {
        let _ = term.clear_screen();
    }
    println!("{}", report.to_human());
}
