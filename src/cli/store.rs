//! Store, get and list commands

use super::build::{build_records, write_output};
use crate::config::Config;
use crate::models::RepoRef;
use crate::rdf::ContentType;
use crate::store::GraphStore;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

pub(super) fn store(
    config: &Config,
    graphs: &GraphStore,
    repo: &RepoRef,
    local: Option<&Path>,
) -> Result<()> {
    let (records, _) = build_records(config, repo, local)?;
    let key = repo.key();
    graphs
        .store(&key, &records)
        .with_context(|| format!("Failed to store graph for {}", key))?;
    eprintln!(
        "{}Stored {} statements under {} in {}",
        style("✓ ").green(),
        records.statement_count(),
        style(&key).bold(),
        graphs.dir().display()
    );
    Ok(())
}

pub(super) fn get(graphs: &GraphStore, repo: &RepoRef, format: ContentType) -> Result<()> {
    let bytes = graphs
        .retrieve(&repo.key(), format)
        .with_context(|| format!("Failed to retrieve graph for {}", repo))?;
    write_output(&bytes, None)
}

pub(super) fn list(graphs: &GraphStore) -> Result<()> {
    let keys = graphs.list_keys()?;
    if keys.is_empty() {
        eprintln!("No stored graphs in {}", graphs.dir().display());
        return Ok(());
    }
    for repo in keys {
        let key = repo.key();
        match graphs.stored_at(&key)? {
            Some(at) => println!(
                "{}  {}",
                key,
                style(at.format("%Y-%m-%d %H:%M:%S UTC")).dim()
            ),
            None => println!("{}", key),
        }
    }
    Ok(())
}
