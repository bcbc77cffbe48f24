//! Commits and the status reports attached to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored or committed a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    /// Platform account login, absent when the email maps to no account.
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// A recent commit on the watched repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub url: String,
    pub author: Identity,
    pub committer: Identity,
    /// Commit message split into its non-empty lines.
    pub message: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommitRecord {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn headline(&self) -> &str {
        self.message.first().map_or("", String::as_str)
    }
}

/// Split a commit message into non-empty lines.
pub fn message_lines(message: &str) -> Vec<String> {
    message
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// State of a source-control status report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusState {
    Pending,
    Success,
    Failure,
    Error,
    Other(String),
}

impl From<String> for StatusState {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<StatusState> for String {
    fn from(state: StatusState) -> Self {
        state.to_string()
    }
}

impl StatusState {
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "success" => Self::Success,
            "failure" => Self::Failure,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
            Self::Error => f.write_str("error"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One status report attached to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: u64,
    pub context: String,
    pub state: StatusState,
    pub target_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Distinct contexts across `statuses`, sorted case-insensitively.
pub fn distinct_contexts(statuses: &[StatusRecord]) -> Vec<String> {
    let mut contexts: Vec<String> = statuses.iter().map(|s| s.context.clone()).collect();
    contexts.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    contexts.dedup();
    contexts
}

/// The live statuses of one context.
///
/// Once any report for the context has progressed past pending, the pending
/// reports are dropped; while every report is still pending, all are kept.
pub fn live_statuses(statuses: &[StatusRecord], context: &str) -> Vec<StatusRecord> {
    let in_context: Vec<&StatusRecord> =
        statuses.iter().filter(|s| s.context == context).collect();
    let progressed = in_context.iter().any(|s| !s.state.is_pending());
    in_context
        .into_iter()
        .filter(|s| !progressed || !s.state.is_pending())
        .cloned()
        .collect()
}
