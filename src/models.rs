//! Data exchanged with commit history providers

use crate::error::{ProvError, ProvResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository identity, `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`. Exactly two non-empty segments are required.
    pub fn parse(key: &str) -> ProvResult<Self> {
        let mut parts = key.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(ProvError::InvalidRepoRef(key.to_string())),
        }
    }

    /// Store key, `owner/name`
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Document namespace: `{service_base}/owner/{owner}/{name}#`
    pub fn namespace(&self, service_base: &str) -> String {
        format!(
            "{}/owner/{}/{}#",
            service_base.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository found by listing an owner or searching GitHub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    pub repo: RepoRef,
    pub description: Option<String>,
    pub fork: bool,
}

/// Author or committer of a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitUser {
    pub name: String,
    pub email: String,
    /// Structured login, when the provider could link the commit to an account
    pub login: Option<String>,
    pub date: DateTime<Utc>,
}

/// One commit as listed by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub sha: String,
    pub parents: Vec<String>,
    pub author: CommitUser,
    pub committer: CommitUser,
    pub message: String,
}

/// How a commit touched a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    /// Any other provider status (renamed, copied, changed, ...)
    #[serde(untagged)]
    Other(String),
}

impl FileStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "added" => FileStatus::Added,
            "removed" => FileStatus::Removed,
            "modified" => FileStatus::Modified,
            other => FileStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Removed => "removed",
            FileStatus::Modified => "modified",
            FileStatus::Other(s) => s,
        }
    }
}

/// A file changed by a commit, with provider-computed line stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u32,
    pub changes: u32,
    pub deletions: u32,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, status: FileStatus) -> Self {
        Self {
            filename: filename.into(),
            status,
            additions: 0,
            changes: 0,
            deletions: 0,
        }
    }

    pub fn added(filename: impl Into<String>) -> Self {
        Self::new(filename, FileStatus::Added)
    }

    pub fn removed(filename: impl Into<String>) -> Self {
        Self::new(filename, FileStatus::Removed)
    }

    pub fn modified(filename: impl Into<String>) -> Self {
        Self::new(filename, FileStatus::Modified)
    }

    pub fn with_stats(mut self, additions: u32, deletions: u32) -> Self {
        self.additions = additions;
        self.deletions = deletions;
        self.changes = additions + deletions;
        self
    }
}

/// Repository contributor as listed by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    /// Account type (User, Organization, Bot)
    pub contributor_type: String,
    pub contributions: u32,
    pub url: String,
}

/// Public profile of an account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}
