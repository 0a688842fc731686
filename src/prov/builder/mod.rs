//! Graph builder
//!
//! Walks a commit history oldest first and emits one Activity per commit, an
//! Association to the resolved author, and per-file entities and relations.
//! A builder is consumed by [`GraphBuilder::build`]; only the finished
//! [`RecordSet`] leaves it.

use crate::error::ProvResult;
use crate::git::{CommitHistory, ContributorDirectory};
use crate::models::{CommitRecord, FileChange, FileStatus, RepoRef};
use crate::prov::contributors::{ContributorResolver, ResolverStrategy};
use crate::prov::ids;
use crate::prov::records::{Activity, ChangeStats, Entity, RecordSet, Relation};
use crate::prov::versions::VersionTracker;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Role attached to every association
pub const AUTHORSHIP_ROLE: &str = "authorship";

pub const DEFAULT_WEB_BASE: &str = "https://github.com";
pub const DEFAULT_SERVICE_BASE: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    pub strategy: ResolverStrategy,
    /// Match login-less authors against known display names
    pub name_fallback: bool,
    /// Base of agent and commit homepages
    pub web_base: String,
    /// Base of the document namespace
    pub service_base: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::Eager,
            name_fallback: true,
            web_base: DEFAULT_WEB_BASE.to_string(),
            service_base: DEFAULT_SERVICE_BASE.to_string(),
        }
    }
}

/// Counters reported when a build completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub commits_seen: usize,
    pub commits_processed: usize,
    /// Commits whose author could not be resolved
    pub commits_skipped: usize,
    /// Repeated shas in the commit stream
    pub duplicate_commits: usize,
    pub files: usize,
    pub agents: usize,
    pub relations: usize,
    /// The provider stopped at a commit cap
    pub truncated: bool,
}

pub struct GraphBuilder {
    repo: RepoRef,
    options: BuildOptions,
    activities: Vec<Activity>,
    seen_commits: HashSet<String>,
    entities: Vec<Entity>,
    base_entities: Vec<Entity>,
    base_labels: HashSet<String>,
    relations: Vec<Relation>,
    tracker: VersionTracker,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new(repo: RepoRef, options: BuildOptions) -> Self {
        Self {
            repo,
            options,
            activities: Vec::new(),
            seen_commits: HashSet::new(),
            entities: Vec::new(),
            base_entities: Vec::new(),
            base_labels: HashSet::new(),
            relations: Vec::new(),
            tracker: VersionTracker::new(),
            stats: BuildStats::default(),
        }
    }

    /// Build the provenance graph of the repository.
    ///
    /// Any provider failure aborts the build; there are no partial results.
    pub fn build(
        mut self,
        history: &dyn CommitHistory,
        directory: &dyn ContributorDirectory,
    ) -> ProvResult<(RecordSet, BuildStats)> {
        info!("Building provenance graph for {}", self.repo);

        let mut resolver = ContributorResolver::for_repository(
            &self.repo,
            directory,
            self.options.strategy,
            &self.options.web_base,
            self.options.name_fallback,
        )?;

        let listing = history.commits(&self.repo)?;
        if listing.truncated {
            warn!(
                "History of {} was truncated at {} commits; the first observed modification of a file has no usage or derivation",
                self.repo,
                listing.commits.len()
            );
        }
        self.stats.truncated = listing.truncated;

        // providers list newest first
        for commit in listing.commits.iter().rev() {
            self.process_commit(commit, history, &mut resolver)?;
        }

        Ok(self.finish(resolver))
    }

    fn process_commit(
        &mut self,
        commit: &CommitRecord,
        history: &dyn CommitHistory,
        resolver: &mut ContributorResolver,
    ) -> ProvResult<()> {
        self.stats.commits_seen += 1;

        if !self.seen_commits.insert(commit.sha.clone()) {
            debug!("Commit {} appears twice in the history, ignoring repeat", commit.sha);
            self.stats.duplicate_commits += 1;
            return Ok(());
        }

        let activity = self.activity(commit);
        let activity_id = activity.id.clone();
        self.activities.push(activity);

        let Some(agent) = resolver.resolve(&commit.author) else {
            info!(
                "Skipping commit {}: author '{}' could not be resolved",
                commit.sha, commit.author.name
            );
            self.stats.commits_skipped += 1;
            return Ok(());
        };

        self.relations.push(Relation::Association {
            id: ids::association_id(&commit.sha),
            activity: activity_id.clone(),
            agent,
            role: AUTHORSHIP_ROLE.to_string(),
        });

        let files = history.commit_files(&self.repo, &commit.sha)?;
        for file in &files {
            self.process_file(commit, &activity_id, file);
        }
        // only now, so a commit never finds itself as a file's predecessor
        for file in &files {
            self.tracker.register_version(&file.filename, &commit.sha);
        }

        for parent in &commit.parents {
            self.relations.push(Relation::Communication {
                id: ids::communication_id(parent, &commit.sha),
                informed: activity_id.clone(),
                informant: ids::activity_id(parent),
            });
        }

        self.stats.commits_processed += 1;
        self.stats.files += files.len();
        Ok(())
    }

    fn activity(&self, commit: &CommitRecord) -> Activity {
        Activity {
            id: ids::activity_id(&commit.sha),
            sha: commit.sha.clone(),
            label: commit.message.clone(),
            timestamp: commit.author.date,
            homepage: format!(
                "{}/{}/{}/commit/{}",
                self.options.web_base.trim_end_matches('/'),
                self.repo.owner,
                self.repo.name,
                commit.sha
            ),
        }
    }

    fn process_file(&mut self, commit: &CommitRecord, activity_id: &str, file: &FileChange) {
        let sha = commit.sha.as_str();
        let filename = file.filename.as_str();
        let time = commit.author.date;
        let versioned_id = ids::versioned_entity_id(filename, sha);
        let base_id = ids::base_entity_id(filename);

        self.entities.push(Entity {
            id: versioned_id.clone(),
            label: filename.to_string(),
        });
        if self.base_labels.insert(filename.to_string()) {
            self.base_entities.push(Entity {
                id: base_id.clone(),
                label: filename.to_string(),
            });
        }
        self.relations.push(Relation::Specialization {
            specific: versioned_id.clone(),
            general: base_id,
        });

        match &file.status {
            FileStatus::Added => {
                self.relations.push(Relation::Generation {
                    id: ids::generation_id(filename, sha),
                    entity: versioned_id,
                    activity: activity_id.to_string(),
                    time,
                });
            }
            FileStatus::Removed => {
                self.relations.push(Relation::Invalidation {
                    id: ids::invalidation_id(filename, sha),
                    entity: versioned_id,
                    activity: activity_id.to_string(),
                    time,
                });
            }
            FileStatus::Modified => {
                let generation_id = ids::generation_id(filename, sha);
                self.relations.push(Relation::Generation {
                    id: generation_id.clone(),
                    entity: versioned_id.clone(),
                    activity: activity_id.to_string(),
                    time,
                });

                let Some(previous) = self.tracker.previous_version(filename) else {
                    debug!(
                        "No previous version of {} before {}, skipping usage and derivation",
                        filename, sha
                    );
                    return;
                };
                let previous_id = ids::versioned_entity_id(filename, previous);
                let usage_id = ids::usage_id(filename, sha, previous);
                let derivation_id = ids::derivation_id(filename, sha, previous);

                self.relations.push(Relation::Usage {
                    id: usage_id.clone(),
                    activity: activity_id.to_string(),
                    entity: previous_id.clone(),
                    time,
                });
                self.relations.push(Relation::Derivation {
                    id: derivation_id,
                    generated: versioned_id,
                    used: previous_id,
                    activity: activity_id.to_string(),
                    generation: generation_id,
                    usage: usage_id,
                    stats: ChangeStats {
                        additions: file.additions,
                        changes: file.changes,
                        deletions: file.deletions,
                    },
                });
            }
            FileStatus::Other(status) => {
                debug!(
                    "File {} in {} has status '{}', recording entity only",
                    filename, sha, status
                );
            }
        }
    }

    fn finish(mut self, resolver: ContributorResolver) -> (RecordSet, BuildStats) {
        // stable sort keeps insertion order within a kind
        self.relations.sort_by_key(|r| r.kind());

        self.stats.agents = resolver.len();
        self.stats.relations = self.relations.len();
        info!(
            "Built graph for {}: {} commits processed, {} skipped, {} files, {} agents, {} relations",
            self.repo,
            self.stats.commits_processed,
            self.stats.commits_skipped,
            self.stats.files,
            self.stats.agents,
            self.stats.relations
        );

        let records = RecordSet {
            repository: self.repo.key(),
            namespace: self.repo.namespace(&self.options.service_base),
            activities: self.activities,
            agents: resolver.into_agents(),
            entities: self.entities,
            base_entities: self.base_entities,
            relations: self.relations,
        };
        (records, self.stats)
    }
}

#[cfg(test)]
mod tests;
