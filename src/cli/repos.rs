//! Repository discovery commands

use crate::git::{GithubClient, OwnerKind};
use crate::models::RepoSummary;
use anyhow::{Context, Result};
use console::style;

pub(super) fn list(client: &GithubClient, owner: &str, kind: OwnerKind) -> Result<()> {
    let found = client
        .repositories(owner, kind)
        .with_context(|| format!("Failed to list repositories of {}", owner))?;
    print_summaries(&found, &format!("{} has no public repositories", owner));
    Ok(())
}

pub(super) fn search(client: &GithubClient, query: &str, limit: usize) -> Result<()> {
    let found = client
        .search_repositories(query, limit)
        .with_context(|| format!("Failed to search repositories for '{}'", query))?;
    print_summaries(&found, &format!("No repositories match '{}'", query));
    Ok(())
}

fn print_summaries(found: &[RepoSummary], empty: &str) {
    if found.is_empty() {
        eprintln!("{}", empty);
        return;
    }
    for summary in found {
        let fork = if summary.fork {
            style(" (fork)").dim().to_string()
        } else {
            String::new()
        };
        match &summary.description {
            Some(description) => println!(
                "{}{}  {}",
                summary.repo.key(),
                fork,
                style(description).dim()
            ),
            None => println!("{}{}", summary.repo.key(), fork),
        }
    }
}
