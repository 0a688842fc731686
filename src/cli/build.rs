//! Build command: commit history → provenance graph

use crate::config::Config;
use crate::git::{CommitHistory, ContributorDirectory, GitHistory};
use crate::models::RepoRef;
use crate::prov::{BuildStats, GraphBuilder, RecordSet};
use crate::rdf::{self, ContentType};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Build the graph of `repo` from GitHub, or from the clone at `local`
pub(super) fn build_records(
    config: &Config,
    repo: &RepoRef,
    local: Option<&Path>,
) -> Result<(RecordSet, BuildStats)> {
    let options = config.build_options()?;
    let builder = GraphBuilder::new(repo.clone(), options);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let start = Instant::now();

    let result = match local {
        Some(path) => {
            spinner.set_message(format!("Reading history of {}...", path.display()));
            let history = GitHistory::open(path)
                .with_context(|| format!("{} is not a git repository", path.display()))?
                .with_max_commits(config.max_commits());
            run_builder(builder, &history, &history)
        }
        None => {
            spinner.set_message(format!("Fetching history of {} from GitHub...", repo));
            let client = super::github_client(config).with_max_commits(config.max_commits());
            run_builder(builder, &client, &client)
        }
    };

    let (records, stats) = match result {
        Ok(built) => built,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.context(format!("Failed to build provenance for {}", repo)));
        }
    };

    spinner.finish_with_message(format!(
        "{}Built provenance for {}: {} commits, {} files, {} agents, {} relations ({:.1}s)",
        style("✓ ").green(),
        style(repo).bold(),
        stats.commits_processed,
        stats.files,
        stats.agents,
        stats.relations,
        start.elapsed().as_secs_f64()
    ));
    if stats.commits_skipped > 0 {
        eprintln!(
            "  {} commits skipped (author could not be resolved)",
            style(stats.commits_skipped).yellow()
        );
    }
    if stats.truncated {
        eprintln!(
            "  {}history stopped at the configured commit cap",
            style("⚠ ").yellow()
        );
    }

    Ok((records, stats))
}

fn run_builder(
    builder: GraphBuilder,
    history: &dyn CommitHistory,
    directory: &dyn ContributorDirectory,
) -> Result<(RecordSet, BuildStats)> {
    Ok(builder.build(history, directory)?)
}

pub(super) fn run(
    config: &Config,
    repo: &RepoRef,
    local: Option<&Path>,
    format: ContentType,
    output: Option<&Path>,
) -> Result<()> {
    let (records, _) = build_records(config, repo, local)?;
    let bytes = rdf::serialize(&records, format)?;
    write_output(&bytes, output)
}

/// Write to `output`, or stdout when absent
pub(super) fn write_output(bytes: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{}Wrote {}", style("✓ ").green(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
