//! GitHub REST API v3 response models.
//!
//! These structs map to the JSON payloads of the commit and status
//! endpoints. They are internal to the GitHub adapters and are not part
//! of the public domain model.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::commit::{message_lines, CommitRecord, Identity};
use crate::domain::models::{StatusRecord, StatusState};

/// A commit returned by `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: String,
    pub commit: GitHubGitCommit,
    /// Platform account of the author; null when the email maps to no account.
    #[serde(default)]
    pub author: Option<GitHubAccount>,
    #[serde(default)]
    pub committer: Option<GitHubAccount>,
}

/// The git-level commit object.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubGitCommit {
    pub author: GitHubSignature,
    pub committer: GitHubSignature,
    #[serde(default)]
    pub message: String,
}

/// Name, email and date from the git signature.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSignature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// A GitHub user account.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAccount {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A status returned by `GET /repos/{owner}/{repo}/commits/{sha}/statuses`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubStatus {
    pub id: u64,
    pub context: String,
    pub state: String,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn identity(signature: &GitHubSignature, account: Option<&GitHubAccount>) -> Identity {
    Identity {
        name: signature.name.clone(),
        email: signature.email.clone(),
        username: account.map(|a| a.login.clone()),
        avatar_url: account.and_then(|a| a.avatar_url.clone()),
    }
}

impl From<&GitHubCommit> for CommitRecord {
    fn from(c: &GitHubCommit) -> Self {
        CommitRecord {
            sha: c.sha.clone(),
            url: c.html_url.clone(),
            author: identity(&c.commit.author, c.author.as_ref()),
            committer: identity(&c.commit.committer, c.committer.as_ref()),
            message: message_lines(&c.commit.message),
            timestamp: c.commit.committer.date,
        }
    }
}

impl From<&GitHubStatus> for StatusRecord {
    fn from(s: &GitHubStatus) -> Self {
        StatusRecord {
            id: s.id,
            context: s.context.clone(),
            state: StatusState::parse(&s.state),
            target_url: s.target_url.clone(),
            updated_at: s.updated_at,
            description: s.description.clone(),
            avatar_url: s.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_deserialization_and_normalization() {
        let json = r#"{
            "sha": "0123456789abcdef",
            "html_url": "https://github.com/org/repo/commit/0123456789abcdef",
            "commit": {
                "author": { "name": "Rob", "email": "rob@example.com", "date": "2024-03-01T10:00:00Z" },
                "committer": { "name": "GitHub", "email": "noreply@github.com", "date": "2024-03-01T10:05:00Z" },
                "message": "bump win10 pool\n\npool-deploy\n"
            },
            "author": { "login": "rob", "id": 7, "avatar_url": "https://avatars/rob" },
            "committer": null
        }"#;
        let commit: GitHubCommit = serde_json::from_str(json).unwrap();
        let record = CommitRecord::from(&commit);

        assert_eq!(record.short_sha(), "0123456");
        assert_eq!(record.author.username.as_deref(), Some("rob"));
        assert_eq!(record.committer.username, None);
        assert_eq!(record.committer.name, "GitHub");
        assert_eq!(record.message, vec!["bump win10 pool", "pool-deploy"]);
        assert_eq!(
            record.timestamp,
            Some("2024-03-01T10:05:00Z".parse().unwrap())
        );
    }

    #[test]
    fn test_status_deserialization() {
        let json = r#"{
            "id": 99,
            "context": "Taskcluster (push)",
            "state": "success",
            "target_url": "https://tc.example.com/tasks/groups/abc",
            "updated_at": "2024-03-01T10:10:00Z",
            "description": "Taskcluster-CI (push)",
            "avatar_url": null
        }"#;
        let status: GitHubStatus = serde_json::from_str(json).unwrap();
        let record = StatusRecord::from(&status);
        assert_eq!(record.id, 99);
        assert_eq!(record.state, StatusState::Success);
        assert!(record.avatar_url.is_none());
    }
}
