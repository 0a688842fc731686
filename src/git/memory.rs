//! In-memory history provider
//!
//! Replays a recorded history. Commits are added oldest first and listed
//! newest first, like a remote provider would.

use super::{CommitHistory, CommitListing, ContributorDirectory};
use crate::error::{ProvError, ProvResult};
use crate::models::{CommitRecord, CommitUser, Contributor, FileChange, RepoRef, UserProfile};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    commits: Vec<CommitRecord>,
    files: HashMap<String, Vec<FileChange>>,
    contributors: Vec<Contributor>,
    profiles: HashMap<String, UserProfile>,
    failing: HashSet<String>,
    truncated: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit (chronological order) with the files it changed.
    pub fn with_commit(mut self, commit: CommitRecord, files: Vec<FileChange>) -> Self {
        self.files.insert(commit.sha.clone(), files);
        self.commits.push(commit);
        self
    }

    pub fn with_contributor(mut self, contributor: Contributor, profile: UserProfile) -> Self {
        self.profiles.insert(contributor.login.clone(), profile);
        self.contributors.push(contributor);
        self
    }

    /// Make the file listing of `sha` fail, as a broken upstream would.
    pub fn failing_files(mut self, sha: &str) -> Self {
        self.failing.insert(sha.to_string());
        self
    }

    pub fn truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }
}

impl CommitHistory for MemorySource {
    fn commits(&self, _repo: &RepoRef) -> ProvResult<CommitListing> {
        Ok(CommitListing {
            commits: self.commits.iter().rev().cloned().collect(),
            truncated: self.truncated,
        })
    }

    fn commit_files(&self, repo: &RepoRef, sha: &str) -> ProvResult<Vec<FileChange>> {
        if self.failing.contains(sha) {
            return Err(ProvError::fetch(
                format!("files of {} in {}", sha, repo),
                "connection reset",
            ));
        }
        self.files
            .get(sha)
            .cloned()
            .ok_or_else(|| ProvError::fetch(format!("commit {} in {}", sha, repo), "no such commit"))
    }
}

impl ContributorDirectory for MemorySource {
    fn contributors(&self, _repo: &RepoRef) -> ProvResult<Vec<Contributor>> {
        Ok(self.contributors.clone())
    }

    fn user(&self, login: &str) -> ProvResult<UserProfile> {
        Ok(self.profiles.get(login).cloned().unwrap_or_default())
    }
}

/// Commit with identical author and committer
pub fn commit(
    sha: &str,
    parents: &[&str],
    author: CommitUser,
    message: &str,
) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        parents: parents.iter().map(|p| p.to_string()).collect(),
        committer: author.clone(),
        author,
        message: message.to_string(),
    }
}

/// Author linked to an account login
pub fn author(login: &str, name: &str, date: DateTime<Utc>) -> CommitUser {
    CommitUser {
        name: name.to_string(),
        email: format!("{}@users.noreply.github.com", login),
        login: Some(login.to_string()),
        date,
    }
}

/// Author known only by name and email
pub fn anonymous_author(name: &str, email: &str, date: DateTime<Utc>) -> CommitUser {
    CommitUser {
        name: name.to_string(),
        email: email.to_string(),
        login: None,
        date,
    }
}
