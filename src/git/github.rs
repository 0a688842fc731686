//! GitHub REST API provider
//!
//! Sync HTTP via ureq, no async runtime. Listings are paged until exhausted
//! unless a commit cap is configured. Besides the two provider traits the
//! client lists and searches repositories, so `owner/name` keys can be found
//! before building.

use super::{CommitHistory, CommitListing, ContributorDirectory};
use crate::error::{ProvError, ProvResult};
use crate::models::{
    CommitRecord, CommitUser, Contributor, FileChange, FileStatus, RepoRef, RepoSummary,
    UserProfile,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
/// GitHub pages the file list of a single commit at 300 entries
const FILES_PER_PAGE: usize = 300;
/// and stops listing after 3000 files
const MAX_FILE_PAGES: usize = 10;

/// Whose repositories to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    User,
    Organization,
}

/// GitHub client implementing both provider traits
pub struct GithubClient {
    api_url: String,
    token: Option<String>,
    max_commits: Option<usize>,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to ProvError::Upstream
        .timeout_global(Some(Duration::from_secs(60)))
        .build()
        .new_agent()
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            max_commits: None,
            agent: make_agent(),
        }
    }

    /// Stop the commit listing after `max` commits.
    pub fn with_max_commits(mut self, max: Option<usize>) -> Self {
        self.max_commits = max;
        self
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> ProvResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut req = self
            .agent
            .get(url.as_str())
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "gitprov");
        for (key, value) in query {
            req = req.query(key, value);
        }
        if let Some(token) = &self.token {
            req = req.header("Authorization", &format!("Bearer {}", token));
        }

        let response = req.call().map_err(|e| ProvError::fetch(what, e))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(ProvError::Upstream {
                what: what.to_string(),
                status,
                message,
            });
        }

        response
            .into_body()
            .read_json()
            .map_err(|e| ProvError::fetch(what, e))
    }

    /// Fetch every page of a listing, up to `limit` items.
    /// The flag is true when the limit cut the listing short.
    fn get_paged<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        limit: Option<usize>,
    ) -> ProvResult<(Vec<T>, bool)> {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let batch: Vec<T> = self.get_json(
                what,
                path,
                &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
            )?;
            let fetched = batch.len();
            items.extend(batch);

            if let Some(limit) = limit {
                if items.len() >= limit {
                    let truncated = if items.len() > limit {
                        true
                    } else if fetched == PER_PAGE {
                        // limit fell on a page boundary
                        self.has_item(what, path, page * PER_PAGE + 1)?
                    } else {
                        false
                    };
                    items.truncate(limit);
                    return Ok((items, truncated));
                }
            }
            if fetched < PER_PAGE {
                return Ok((items, false));
            }
            debug!("Fetched page {} of {}", page, what);
            page += 1;
        }
    }

    /// Whether the listing has an item at 1-based `position`.
    fn has_item(&self, what: &str, path: &str, position: usize) -> ProvResult<bool> {
        let next: Vec<serde_json::Value> = self.get_json(
            what,
            path,
            &[("per_page", "1".to_string()), ("page", position.to_string())],
        )?;
        Ok(!next.is_empty())
    }

    /// Every repository of a user or an organization.
    pub fn repositories(&self, owner: &str, kind: OwnerKind) -> ProvResult<Vec<RepoSummary>> {
        let path = match kind {
            OwnerKind::User => format!("/users/{}/repos", owner),
            OwnerKind::Organization => format!("/orgs/{}/repos", owner),
        };
        let (items, _) =
            self.get_paged::<GhRepository>(&format!("repositories of {}", owner), &path, None)?;
        Ok(items.into_iter().map(GhRepository::into_summary).collect())
    }

    /// Repositories matching a GitHub search query, best match first.
    pub fn search_repositories(&self, query: &str, limit: usize) -> ProvResult<Vec<RepoSummary>> {
        let found: GhSearch = self.get_json(
            &format!("repositories matching '{}'", query),
            "/search/repositories",
            &[
                ("q", query.to_string()),
                ("per_page", limit.clamp(1, PER_PAGE).to_string()),
            ],
        )?;
        Ok(found
            .items
            .into_iter()
            .take(limit)
            .map(GhRepository::into_summary)
            .collect())
    }
}

impl CommitHistory for GithubClient {
    fn commits(&self, repo: &RepoRef) -> ProvResult<CommitListing> {
        let path = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        let (items, truncated) =
            self.get_paged::<GhCommitItem>(&format!("commits of {}", repo), &path, self.max_commits)?;
        Ok(CommitListing {
            commits: items.into_iter().map(GhCommitItem::into_record).collect(),
            truncated,
        })
    }

    fn commit_files(&self, repo: &RepoRef, sha: &str) -> ProvResult<Vec<FileChange>> {
        let path = format!("/repos/{}/{}/commits/{}", repo.owner, repo.name, sha);
        let what = format!("commit {} of {}", sha, repo);
        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let detail: GhCommitDetail =
                self.get_json(&what, &path, &[("page", page.to_string())])?;
            let fetched = detail.files.len();
            files.extend(detail.files.into_iter().map(GhFile::into_change));
            if fetched < FILES_PER_PAGE {
                return Ok(files);
            }
        }
        warn!(
            "{} changes more than {} files, GitHub does not list the rest",
            what,
            files.len()
        );
        Ok(files)
    }
}

impl ContributorDirectory for GithubClient {
    fn contributors(&self, repo: &RepoRef) -> ProvResult<Vec<Contributor>> {
        let path = format!("/repos/{}/{}/contributors", repo.owner, repo.name);
        let (items, _) =
            self.get_paged::<GhContributor>(&format!("contributors of {}", repo), &path, None)?;
        Ok(items
            .into_iter()
            .filter_map(GhContributor::into_contributor)
            .collect())
    }

    fn user(&self, login: &str) -> ProvResult<UserProfile> {
        let user: GhUser = self.get_json(&format!("user {}", login), &format!("/users/{}", login), &[])?;
        Ok(UserProfile {
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
        })
    }
}

// GitHub API types
#[derive(Deserialize)]
struct GhCommitItem {
    sha: String,
    commit: GhCommit,
    author: Option<GhAccount>,
    committer: Option<GhAccount>,
    #[serde(default)]
    parents: Vec<GhParent>,
}

#[derive(Deserialize)]
struct GhCommit {
    author: GhSignature,
    committer: GhSignature,
    message: String,
}

#[derive(Deserialize)]
struct GhSignature {
    name: String,
    #[serde(default)]
    email: String,
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct GhAccount {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Deserialize)]
struct GhParent {
    sha: String,
}

#[derive(Deserialize)]
struct GhCommitDetail {
    #[serde(default)]
    files: Vec<GhFile>,
}

#[derive(Deserialize)]
struct GhFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
    #[serde(default)]
    changes: u32,
}

#[derive(Deserialize)]
struct GhContributor {
    login: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    contributions: u32,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct GhRepository {
    name: String,
    owner: GhOwner,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fork: bool,
}

#[derive(Deserialize)]
struct GhOwner {
    login: String,
}

#[derive(Deserialize)]
struct GhSearch {
    items: Vec<GhRepository>,
}

#[derive(Deserialize)]
struct GhUser {
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

impl GhSignature {
    fn into_user(self, account: Option<GhAccount>) -> CommitUser {
        CommitUser {
            name: self.name,
            email: self.email,
            login: account.and_then(|a| a.login),
            date: self.date,
        }
    }
}

impl GhCommitItem {
    fn into_record(self) -> CommitRecord {
        CommitRecord {
            sha: self.sha,
            parents: self.parents.into_iter().map(|p| p.sha).collect(),
            author: self.commit.author.into_user(self.author),
            committer: self.commit.committer.into_user(self.committer),
            message: self.commit.message,
        }
    }
}

impl GhFile {
    fn into_change(self) -> FileChange {
        FileChange {
            filename: self.filename,
            status: FileStatus::parse(&self.status),
            additions: self.additions,
            changes: self.changes,
            deletions: self.deletions,
        }
    }
}

impl GhContributor {
    /// Anonymous contributors carry no login and are dropped
    fn into_contributor(self) -> Option<Contributor> {
        Some(Contributor {
            login: self.login?,
            contributor_type: self.kind,
            contributions: self.contributions,
            url: self.url.unwrap_or_default(),
        })
    }
}

impl GhRepository {
    fn into_summary(self) -> RepoSummary {
        RepoSummary {
            repo: RepoRef::new(self.owner.login, self.name),
            description: self.description.filter(|d| !d.is_empty()),
            fork: self.fork,
        }
    }
}
