//! CLI command definitions and handlers

mod build;
mod query;
mod repos;
mod store;

use crate::config::Config;
use crate::git::{GithubClient, OwnerKind};
use crate::models::RepoRef;
use crate::query::ResultFormat;
use crate::rdf::ContentType;
use crate::store::GraphStore;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

fn parse_repo(s: &str) -> Result<RepoRef, String> {
    RepoRef::parse(s).map_err(|e| e.to_string())
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    let content_type: ContentType = s.parse().map_err(|e: crate::error::ProvError| e.to_string())?;
    if !content_type.is_producible() {
        return Err(format!("{} cannot be produced", content_type.mime()));
    }
    Ok(content_type)
}

fn parse_result_format(s: &str) -> Result<ResultFormat, String> {
    s.parse().map_err(|e: crate::error::ProvError| e.to_string())
}

/// gitprov - provenance graphs from git history
#[derive(Parser, Debug)]
#[command(name = "gitprov")]
#[command(
    version,
    about = "Build W3C PROV provenance graphs from git commit history",
    after_help = "\
Examples:
  gitprov repos octocat                             Repositories to build from
  gitprov build octocat/hello-world                 Turtle to stdout from GitHub
  gitprov build me/tool --local . -f provn          PROV-N from a local clone
  gitprov store octocat/hello-world                 Build and persist in the store
  gitprov get octocat/hello-world -f jsonld         Stored graph as JSON-LD
  gitprov query octocat/hello-world 'SELECT ?c WHERE { ?c a prov:Activity }'"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Graph store directory (overrides config and GITPROV_STORE_DIR)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the GitHub repositories of a user or organization, or search for some
    Repos {
        /// User or organization login
        #[arg(required_unless_present = "search")]
        owner: Option<String>,

        /// List an organization's repositories
        #[arg(long, requires = "owner")]
        org: bool,

        /// GitHub search query instead of an owner (e.g. "prov language:rust")
        #[arg(long, conflicts_with = "owner")]
        search: Option<String>,

        /// Maximum number of search results
        #[arg(long, default_value = "30")]
        limit: usize,
    },

    /// Build the provenance graph of a repository and print it
    Build {
        /// Repository as owner/name
        #[arg(value_parser = parse_repo)]
        repo: RepoRef,

        /// Read history from a local clone instead of GitHub
        #[arg(long)]
        local: Option<PathBuf>,

        /// Output format: MIME type or short name (turtle, provn, provjson, jsonld, ntriples, ...)
        #[arg(long, short = 'f', default_value = "turtle", value_parser = parse_content_type)]
        format: ContentType,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Build the provenance graph of a repository and persist it
    Store {
        /// Repository as owner/name
        #[arg(value_parser = parse_repo)]
        repo: RepoRef,

        /// Read history from a local clone instead of GitHub
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// Print a stored graph
    Get {
        /// Repository as owner/name
        #[arg(value_parser = parse_repo)]
        repo: RepoRef,

        /// Output format: MIME type or short name
        #[arg(long, short = 'f', default_value = "turtle", value_parser = parse_content_type)]
        format: ContentType,
    },

    /// List stored repositories
    List,

    /// Run a SELECT or CONSTRUCT query against a stored graph
    #[command(after_help = "\
Result formats:
  SELECT     text (default), json, xml, csv, tsv
  CONSTRUCT  turtle, ntriples, rdfxml, n3

The document namespace is bound to the gitprov: prefix.")]
    Query {
        /// Repository as owner/name
        #[arg(value_parser = parse_repo)]
        repo: RepoRef,

        /// Query text, or @path to read it from a file
        query: String,

        /// Result format: MIME type or short name
        #[arg(long, short = 'r', value_parser = parse_result_format)]
        result_format: Option<ResultFormat>,
    },

    /// Manage user configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize config file with example settings
    Init,
    /// Show current config and paths
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Repos {
            owner,
            org,
            search,
            limit,
        } => {
            let client = github_client(&config);
            match (owner, search) {
                (_, Some(text)) => repos::search(&client, &text, limit),
                (Some(owner), None) => {
                    let kind = if org {
                        OwnerKind::Organization
                    } else {
                        OwnerKind::User
                    };
                    repos::list(&client, &owner, kind)
                }
                (None, None) => anyhow::bail!("Give an owner or --search"),
            }
        }

        Commands::Build {
            repo,
            local,
            format,
            output,
        } => build::run(&config, &repo, local.as_deref(), format, output.as_deref()),

        Commands::Store { repo, local } => {
            let graphs = open_store(&config, cli.store_dir.as_deref())?;
            store::store(&config, &graphs, &repo, local.as_deref())
        }

        Commands::Get { repo, format } => {
            let graphs = open_store(&config, cli.store_dir.as_deref())?;
            store::get(&graphs, &repo, format)
        }

        Commands::List => {
            let graphs = open_store(&config, cli.store_dir.as_deref())?;
            store::list(&graphs)
        }

        Commands::Query {
            repo,
            query: text,
            result_format,
        } => {
            let graphs = open_store(&config, cli.store_dir.as_deref())?;
            query::run(&graphs, &repo, &text, result_format)
        }

        Commands::Config { action } => run_config_action(&config, action),
    }
}

fn github_client(config: &Config) -> GithubClient {
    GithubClient::new(config.api_url(), config.github_token().map(str::to_string))
}

fn open_store(config: &Config, override_dir: Option<&Path>) -> Result<GraphStore> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => config.store_dir()?,
    };
    GraphStore::open(&dir).with_context(|| format!("Failed to open graph store at {}", dir.display()))
}

fn run_config_action(config: &Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = Config::init_user_config()?;
            println!("{}Config initialized at: {}", style("✓ ").green(), path.display());
            println!("\nOr set via environment:");
            println!("  export GITHUB_TOKEN=\"ghp_...\"");
            Ok(())
        }
        ConfigAction::Show => show_config(config),
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", style("Config paths").bold());
    if let Some(user_path) = Config::user_config_path() {
        let status = if user_path.exists() {
            style("✓").green().to_string()
        } else {
            style("(not found)").dim().to_string()
        };
        println!("  User:  {} {}", user_path.display(), status);
    }
    println!("  Store: {}", config.store_dir()?.display());
    println!();

    println!("{}", style("GitHub").bold());
    println!("  API:    {}", config.api_url());
    println!("  Web:    {}", config.web_url());
    let token_status = if config.github_token().is_some() {
        style("✓ configured").green()
    } else {
        style("✗ not set").yellow()
    };
    println!("  GITHUB_TOKEN: {}", token_status);
    match config.max_commits() {
        Some(max) => println!("  Commit cap: {}", max),
        None => println!("  Commit cap: none"),
    }
    println!();

    let options = config.build_options()?;
    println!("{}", style("Provenance").bold());
    println!("  Service base:  {}", options.service_base);
    println!("  Resolver:      {:?}", options.strategy);
    println!("  Name fallback: {}", options.name_fallback);
    Ok(())
}
