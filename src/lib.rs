//! Pipewatch - read-only CI status dashboard
//!
//! Pipewatch watches the most recent commits of a repository and, for each
//! one, expands every CI status report into its builds, tasks, runs and
//! artifacts. Results roll up into per-commit and per-dashboard summaries:
//! how many tasks sit in each lifecycle state, and how many machine images
//! were deployed per worker pool.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, the summary monoid, errors and the adapter port
//! - **Adapter Layer** (`adapters`): one read-only adapter per upstream CI system
//! - **Service Layer** (`services`): the aggregation tree, poll scheduling and the dashboard
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pipewatch::{Config, Dashboard, JitterScheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let scheduler = Arc::new(JitterScheduler::from_config(&config.poll));
//!     let mut dashboard = Dashboard::from_config(&config, scheduler)?;
//!     let mut summary = dashboard.summary();
//!     dashboard.start();
//!     summary.changed().await?;
//!     println!("{:?}", summary.borrow().counts());
//!     dashboard.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::AdapterSet;
pub use domain::errors::{FetchError, FetchResult};
pub use domain::models::{Config, NodeScope, NormalizedBatch, Summary, TaskState};
pub use domain::ports::NodeAdapter;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Dashboard, DashboardView, JitterScheduler, ManualScheduler};
