//! GitHub source-control adapters.
//!
//! Read-only integration with a repository's commit list and commit
//! statuses. The commit list feeds the dashboard root; the status list
//! feeds both the commit and the context levels of the tree.

pub mod client;
pub mod commits;
pub mod models;
pub mod statuses;

pub use client::GitHubClient;
pub use commits::CommitListAdapter;
pub use statuses::StatusListAdapter;
