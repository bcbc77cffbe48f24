//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::snapshot::SnapshotArgs;
use super::commands::watch::WatchArgs;

#[derive(Parser, Debug)]
#[command(name = "pipewatch")]
#[command(about = "Pipewatch - read-only CI status dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Extra config file, applied on top of every other source
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll continuously and re-render whenever the dashboard changes
    Watch(WatchArgs),

    /// Expand the tree once, wait for it to settle, print and exit
    Snapshot(SnapshotArgs),

    /// Print the effective configuration
    Config,
}
