//! Commit author → Agent resolution
//!
//! Two phases: an optional eager pass that builds one Agent per repository
//! contributor, then per-commit lookups by login. Commits without a login can
//! fall back to an exact display-name match when the fallback is enabled.

use crate::error::ProvResult;
use crate::git::ContributorDirectory;
use crate::models::{CommitUser, RepoRef};
use crate::prov::ids;
use crate::prov::records::Agent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// How agents are populated for a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Fetch the contributor list (and each profile) before processing commits
    #[default]
    Eager,
    /// Create agents from commit authors as they appear
    Lazy,
}

impl ResolverStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Some(ResolverStrategy::Eager),
            "lazy" => Some(ResolverStrategy::Lazy),
            _ => None,
        }
    }
}

/// Deduplicated agents for one build, indexed by login and display name.
#[derive(Debug)]
pub struct ContributorResolver {
    agents: Vec<Agent>,
    by_login: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    name_fallback: bool,
    web_base: String,
}

impl ContributorResolver {
    pub fn new(web_base: &str, name_fallback: bool) -> Self {
        Self {
            agents: Vec::new(),
            by_login: HashMap::new(),
            by_name: HashMap::new(),
            name_fallback,
            web_base: web_base.trim_end_matches('/').to_string(),
        }
    }

    /// Build the resolver according to `strategy`.
    ///
    /// The eager strategy fetches contributors and their profiles; any
    /// provider failure aborts.
    pub fn for_repository(
        repo: &RepoRef,
        directory: &dyn ContributorDirectory,
        strategy: ResolverStrategy,
        web_base: &str,
        name_fallback: bool,
    ) -> ProvResult<Self> {
        let mut resolver = Self::new(web_base, name_fallback);
        if strategy == ResolverStrategy::Lazy {
            return Ok(resolver);
        }

        let contributors = directory.contributors(repo)?;
        debug!("Resolving {} contributors of {}", contributors.len(), repo);

        for contributor in contributors {
            if resolver.by_login.contains_key(&contributor.login) {
                continue;
            }
            let profile = directory.user(&contributor.login)?;
            let agent = Agent {
                id: ids::agent_id(&contributor.login),
                homepage: resolver.homepage(&contributor.login),
                login: contributor.login,
                display_name: profile.name,
                email: profile.email,
                avatar_url: profile.avatar_url,
                agent_type: Some(contributor.contributor_type),
                contributions: Some(contributor.contributions),
            };
            resolver.insert(agent);
        }

        Ok(resolver)
    }

    /// Agent id for a commit author, or `None` when the author is unresolvable.
    pub fn resolve(&mut self, author: &CommitUser) -> Option<String> {
        if let Some(login) = author.login.as_deref().filter(|l| !l.is_empty()) {
            if let Some(&idx) = self.by_login.get(login) {
                return Some(self.agents[idx].id.clone());
            }
            debug!("Creating agent for {} from commit author", login);
            let agent = Agent {
                id: ids::agent_id(login),
                login: login.to_string(),
                display_name: Some(author.name.clone()).filter(|n| !n.is_empty()),
                email: Some(author.email.clone()).filter(|e| !e.is_empty()),
                homepage: self.homepage(login),
                avatar_url: None,
                agent_type: None,
                contributions: None,
            };
            let idx = self.insert(agent);
            return Some(self.agents[idx].id.clone());
        }

        if !self.name_fallback {
            return None;
        }
        self.by_name
            .get(&author.name)
            .map(|&idx| self.agents[idx].id.clone())
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    fn homepage(&self, login: &str) -> String {
        format!("{}/{}", self.web_base, login)
    }

    fn insert(&mut self, agent: Agent) -> usize {
        let idx = self.agents.len();
        self.by_login.insert(agent.login.clone(), idx);
        if let Some(name) = agent.display_name.as_ref() {
            // first agent to claim a display name keeps it
            self.by_name.entry(name.clone()).or_insert(idx);
        }
        self.agents.push(agent);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemorySource;
    use crate::models::{Contributor, UserProfile};
    use chrono::Utc;

    fn author(name: &str, login: Option<&str>) -> CommitUser {
        CommitUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            login: login.map(str::to_string),
            date: Utc::now(),
        }
    }

    fn directory() -> MemorySource {
        MemorySource::new()
            .with_contributor(
                Contributor {
                    login: "octocat".to_string(),
                    contributor_type: "User".to_string(),
                    contributions: 12,
                    url: "https://api.github.com/users/octocat".to_string(),
                },
                UserProfile {
                    email: Some("octo@example.com".to_string()),
                    name: Some("Mona Lisa".to_string()),
                    avatar_url: Some("https://avatars.example.com/1".to_string()),
                },
            )
            .with_contributor(
                Contributor {
                    login: "ci-bot".to_string(),
                    contributor_type: "Bot".to_string(),
                    contributions: 3,
                    url: "https://api.github.com/users/ci-bot".to_string(),
                },
                UserProfile::default(),
            )
    }

    #[test]
    fn test_eager_builds_agents_from_contributors() {
        let repo = RepoRef::new("octo", "hello");
        let resolver = ContributorResolver::for_repository(
            &repo,
            &directory(),
            ResolverStrategy::Eager,
            "https://github.com",
            true,
        )
        .unwrap();

        assert_eq!(resolver.len(), 2);
        let octo = &resolver.agents()[0];
        assert_eq!(octo.id, "octocat");
        assert_eq!(octo.homepage, "https://github.com/octocat");
        assert_eq!(octo.contributions, Some(12));
        assert_eq!(octo.display_name.as_deref(), Some("Mona Lisa"));
        assert_eq!(resolver.agents()[1].agent_type.as_deref(), Some("Bot"));
    }

    #[test]
    fn test_lazy_does_not_prefetch() {
        let repo = RepoRef::new("octo", "hello");
        let mut resolver = ContributorResolver::for_repository(
            &repo,
            &directory(),
            ResolverStrategy::Lazy,
            "https://github.com",
            true,
        )
        .unwrap();
        assert!(resolver.is_empty());

        let id = resolver.resolve(&author("Alice", Some("alice")));
        assert_eq!(id.as_deref(), Some("alice"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_same_login_resolves_to_one_agent() {
        let mut resolver = ContributorResolver::new("https://github.com", true);
        for _ in 0..3 {
            resolver.resolve(&author("Alice", Some("alice")));
        }
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_name_fallback() {
        let repo = RepoRef::new("octo", "hello");
        let mut resolver = ContributorResolver::for_repository(
            &repo,
            &directory(),
            ResolverStrategy::Eager,
            "https://github.com",
            true,
        )
        .unwrap();

        let id = resolver.resolve(&author("Mona Lisa", None));
        assert_eq!(id.as_deref(), Some("octocat"));

        // no display name match: unresolvable, and never a default agent
        assert_eq!(resolver.resolve(&author("Stranger", None)), None);
    }

    #[test]
    fn test_name_fallback_disabled() {
        let mut resolver = ContributorResolver::new("https://github.com", false);
        resolver.resolve(&author("Alice", Some("alice")));
        assert_eq!(resolver.resolve(&author("Alice", None)), None);
    }
}
