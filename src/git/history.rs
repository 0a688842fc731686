//! Local repository history using libgit2
//!
//! Lists commits, per-file change status and line stats over a local
//! repository using the git2 crate (Rust bindings to libgit2). Git has no
//! account logins, so the author email stands in for one.

use super::{CommitHistory, CommitListing, ContributorDirectory};
use crate::error::ProvResult;
use crate::models::{
    CommitRecord, CommitUser, Contributor, FileChange, FileStatus, RepoRef, UserProfile,
};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Delta, Oid, Repository, Signature, Sort};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// An author identity aggregated over the whole history.
#[derive(Debug, Clone)]
struct LocalIdentity {
    login: String,
    name: String,
    email: String,
    commits: u32,
}

/// Local git history provider.
pub struct GitHistory {
    repo: Repository,
    max_commits: Option<usize>,
    identities: OnceCell<Vec<LocalIdentity>>,
}

impl GitHistory {
    /// Open a git repository.
    ///
    /// # Arguments
    /// * `path` - Path to the repository (or any subdirectory)
    pub fn open(path: &Path) -> ProvResult<Self> {
        let repo = Repository::discover(path)?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self {
            repo,
            max_commits: None,
            identities: OnceCell::new(),
        })
    }

    /// Stop listing after `max` commits (newest first).
    pub fn with_max_commits(mut self, max: Option<usize>) -> Self {
        self.max_commits = max;
        self
    }

    fn walk(&self) -> ProvResult<git2::Revwalk<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        // children before parents, so reversing yields chronological order
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_head()?;
        Ok(revwalk)
    }

    fn commit_record(&self, commit: &git2::Commit) -> CommitRecord {
        CommitRecord {
            sha: commit.id().to_string(),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            author: commit_user(&commit.author()),
            committer: commit_user(&commit.committer()),
            message: commit.message().unwrap_or("").trim_end().to_string(),
        }
    }

    fn identities(&self) -> ProvResult<&[LocalIdentity]> {
        if let Some(identities) = self.identities.get() {
            return Ok(identities);
        }

        let mut identities: Vec<LocalIdentity> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for oid in self.walk()? {
            let commit = self.repo.find_commit(oid?)?;
            let author = commit_user(&commit.author());
            let login = author.login.unwrap_or_default();
            match index.get(&login) {
                Some(&idx) => identities[idx].commits += 1,
                None => {
                    index.insert(login.clone(), identities.len());
                    identities.push(LocalIdentity {
                        login,
                        name: author.name,
                        email: author.email,
                        commits: 1,
                    });
                }
            }
        }

        Ok(self.identities.get_or_init(|| identities))
    }
}

impl CommitHistory for GitHistory {
    fn commits(&self, repo: &RepoRef) -> ProvResult<CommitListing> {
        let mut listing = CommitListing::default();

        for oid_result in self.walk()? {
            if self.max_commits.is_some_and(|max| listing.commits.len() >= max) {
                listing.truncated = true;
                break;
            }
            let commit = self.repo.find_commit(oid_result?)?;
            listing.commits.push(self.commit_record(&commit));
        }

        debug!(
            "Listed {} commits of {} (truncated: {})",
            listing.commits.len(),
            repo,
            listing.truncated
        );
        Ok(listing)
    }

    fn commit_files(&self, _repo: &RepoRef, sha: &str) -> ProvResult<Vec<FileChange>> {
        let oid = Oid::from_str(sha)?;
        let commit = self.repo.find_commit(oid)?;

        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files = Vec::with_capacity(diff.deltas().len());
        for (idx, delta) in diff.deltas().enumerate() {
            let status = match delta.status() {
                Delta::Added => FileStatus::Added,
                Delta::Deleted => FileStatus::Removed,
                Delta::Modified => FileStatus::Modified,
                Delta::Renamed => FileStatus::Other("renamed".to_string()),
                Delta::Copied => FileStatus::Other("copied".to_string()),
                Delta::Typechange => FileStatus::Other("changed".to_string()),
                other => FileStatus::Other(format!("{:?}", other).to_lowercase()),
            };

            let file = if status == FileStatus::Removed {
                delta.old_file()
            } else {
                delta.new_file()
            };
            let Some(path) = file.path() else {
                continue;
            };

            // Binary files have no patch and count as zero lines
            let (additions, deletions) = match git2::Patch::from_diff(&diff, idx)? {
                Some(patch) => {
                    let (_, additions, deletions) = patch.line_stats()?;
                    (additions as u32, deletions as u32)
                }
                None => (0, 0),
            };

            files.push(FileChange {
                filename: path.to_string_lossy().to_string(),
                status,
                additions,
                changes: additions + deletions,
                deletions,
            });
        }

        Ok(files)
    }
}

impl ContributorDirectory for GitHistory {
    fn contributors(&self, _repo: &RepoRef) -> ProvResult<Vec<Contributor>> {
        Ok(self
            .identities()?
            .iter()
            .map(|identity| Contributor {
                login: identity.login.clone(),
                contributor_type: "User".to_string(),
                contributions: identity.commits,
                url: format!("mailto:{}", identity.email),
            })
            .collect())
    }

    fn user(&self, login: &str) -> ProvResult<UserProfile> {
        let profile = self
            .identities()?
            .iter()
            .find(|identity| identity.login == login)
            .map(|identity| UserProfile {
                email: Some(identity.email.clone()).filter(|e| !e.is_empty()),
                name: Some(identity.name.clone()).filter(|n| !n.is_empty()),
                avatar_url: None,
            })
            .unwrap_or_default();
        Ok(profile)
    }
}

fn commit_user(signature: &Signature) -> CommitUser {
    let name = signature.name().unwrap_or("Unknown").to_string();
    let email = signature.email().unwrap_or("").to_string();
    let login = if email.is_empty() {
        name.clone()
    } else {
        email.clone()
    };
    CommitUser {
        name,
        email,
        login: Some(login),
        date: git_time(&signature.when()),
    }
}

/// Convert a git timestamp to UTC.
fn git_time(time: &git2::Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}
