//! Commit history providers
//!
//! The graph builder consumes two interfaces: [`CommitHistory`] for commits
//! and their file changes, [`ContributorDirectory`] for contributor accounts.
//!
//! # Providers
//!
//! - [`GithubClient`] - GitHub REST API (sync HTTP via ureq)
//! - [`GitHistory`] - a local repository through libgit2
//! - [`MemorySource`] - recorded histories, replayed from memory
//!
//! # Example
//!
//! ```no_run
//! use gitprov::git::GitHistory;
//! use gitprov::models::RepoRef;
//! use gitprov::prov::{BuildOptions, GraphBuilder};
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new("/path/to/repo")).unwrap();
//! let repo = RepoRef::new("local", "repo");
//! let (records, _stats) = GraphBuilder::new(repo, BuildOptions::default())
//!     .build(&history, &history)
//!     .unwrap();
//! ```

pub mod github;
pub mod history;
pub mod memory;

pub use github::{GithubClient, OwnerKind};
pub use history::GitHistory;
pub use memory::MemorySource;

use crate::error::ProvResult;
use crate::models::{CommitRecord, Contributor, FileChange, RepoRef, UserProfile};

/// Commits listed by a provider, newest first
#[derive(Debug, Clone, Default)]
pub struct CommitListing {
    pub commits: Vec<CommitRecord>,
    /// The provider stopped at a configured cap before the end of history
    pub truncated: bool,
}

impl CommitListing {
    pub fn complete(commits: Vec<CommitRecord>) -> Self {
        Self {
            commits,
            truncated: false,
        }
    }
}

/// Source of commits and per-commit file changes
pub trait CommitHistory {
    /// All commits of the repository, newest first
    fn commits(&self, repo: &RepoRef) -> ProvResult<CommitListing>;

    /// Files changed by one commit
    fn commit_files(&self, repo: &RepoRef, sha: &str) -> ProvResult<Vec<FileChange>>;
}

/// Source of contributor accounts
pub trait ContributorDirectory {
    fn contributors(&self, repo: &RepoRef) -> ProvResult<Vec<Contributor>>;

    fn user(&self, login: &str) -> ProvResult<UserProfile>;
}
