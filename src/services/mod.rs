//! Services: the aggregation tree, its schedulers, and the dashboard root.

pub mod aggregator;
pub mod dashboard;
pub mod scheduler;

pub use aggregator::{NodeSnapshot, NodeState};
pub use dashboard::{CommitRow, Dashboard, DashboardView, TaskRow};
pub use scheduler::{JitterScheduler, ManualScheduler, PollTimer, Scheduler};
