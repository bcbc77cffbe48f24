//! Taskcluster queue adapters.
//!
//! Three tree levels are served from the queue API: the task group, the
//! single task, and one run's artifacts.

pub mod artifacts;
pub mod client;
pub mod models;
pub mod task;
pub mod task_group;

pub use artifacts::RunArtifactsAdapter;
pub use client::TaskclusterClient;
pub use task::TaskAdapter;
pub use task_group::TaskGroupAdapter;
