//! User-level configuration for gitprov
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/gitprov/config.toml

use crate::git::github::DEFAULT_API_URL;
use crate::prov::builder::{DEFAULT_SERVICE_BASE, DEFAULT_WEB_BASE};
use crate::prov::{BuildOptions, ResolverStrategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_SERVICE_BASE: &str = "GITPROV_SERVICE_BASE";
pub const ENV_STORE_DIR: &str = "GITPROV_STORE_DIR";

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub provenance: ProvenanceConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct GithubConfig {
    /// Personal access token sent as a bearer token
    pub token: Option<String>,

    /// REST API root (default: https://api.github.com)
    pub api_url: Option<String>,

    /// Web root used for agent and commit homepages (default: https://github.com)
    pub web_url: Option<String>,

    /// Stop listing commits after this many; unset fetches the whole history
    pub max_commits: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProvenanceConfig {
    /// Base of document namespaces (default: http://localhost:8080)
    pub service_base: Option<String>,

    /// "eager" (default) or "lazy"
    pub resolver: Option<String>,

    /// Match login-less authors by display name (default: true)
    pub name_fallback: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Graph store directory (default: <data dir>/gitprov/store)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/gitprov/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = match Self::user_config_path().filter(|p| p.exists()) {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from environment-style lookups
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = lookup(ENV_GITHUB_TOKEN) {
            self.github.token = Some(token);
        }
        if let Some(base) = lookup(ENV_SERVICE_BASE) {
            self.provenance.service_base = Some(base);
        }
        if let Some(dir) = lookup(ENV_STORE_DIR) {
            self.store.path = Some(PathBuf::from(dir));
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitprov").join("config.toml"))
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn web_url(&self) -> &str {
        self.github.web_url.as_deref().unwrap_or(DEFAULT_WEB_BASE)
    }

    pub fn max_commits(&self) -> Option<usize> {
        self.github.max_commits
    }

    pub fn service_base(&self) -> &str {
        self.provenance
            .service_base
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_BASE)
    }

    pub fn resolver(&self) -> Result<ResolverStrategy> {
        match self.provenance.resolver.as_deref() {
            None => Ok(ResolverStrategy::default()),
            Some(s) => ResolverStrategy::parse(s).with_context(|| {
                format!("Unknown resolver '{}' (expected 'eager' or 'lazy')", s)
            }),
        }
    }

    pub fn name_fallback(&self) -> bool {
        self.provenance.name_fallback.unwrap_or(true)
    }

    /// Store directory; falls back to the platform data dir
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(path) = &self.store.path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().or_else(|| {
            warn!("No data directory on this platform, using ./.gitprov");
            std::env::current_dir().ok().map(|d| d.join(".gitprov"))
        });
        data_dir
            .map(|d| d.join("gitprov").join("store"))
            .context("Could not determine a store directory")
    }

    pub fn build_options(&self) -> Result<BuildOptions> {
        Ok(BuildOptions {
            strategy: self.resolver()?,
            name_fallback: self.name_fallback(),
            web_base: self.web_url().trim_end_matches('/').to_string(),
            service_base: self.service_base().trim_end_matches('/').to_string(),
        })
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# gitprov user configuration

[github]
# token = "ghp_..."          # or set GITHUB_TOKEN
# api_url = "https://api.github.com"
# web_url = "https://github.com"
# max_commits = 500          # unset fetches the whole history

[provenance]
# service_base = "http://localhost:8080"   # or GITPROV_SERVICE_BASE
# resolver = "eager"         # "eager" or "lazy"
# name_fallback = true

[store]
# path = "/var/lib/gitprov"  # or GITPROV_STORE_DIR
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github_token().is_none());
        assert_eq!(config.api_url(), "https://api.github.com");
        assert_eq!(config.service_base(), "http://localhost:8080");
        assert_eq!(config.resolver().unwrap(), ResolverStrategy::Eager);
        assert!(config.name_fallback());
        assert_eq!(config.build_options().unwrap(), BuildOptions::default());
    }

    #[test]
    fn test_toml_parsing() {
        let config = Config::from_toml_str(
            r#"
[github]
token = "ghp_test"
max_commits = 50

[provenance]
service_base = "https://prov.example.org/"
resolver = "lazy"
name_fallback = false

[store]
path = "/tmp/graphs"
"#,
        )
        .unwrap();
        assert_eq!(config.github_token(), Some("ghp_test"));
        assert_eq!(config.max_commits(), Some(50));
        assert_eq!(config.store_dir().unwrap(), PathBuf::from("/tmp/graphs"));

        let options = config.build_options().unwrap();
        assert_eq!(options.strategy, ResolverStrategy::Lazy);
        assert!(!options.name_fallback);
        assert_eq!(options.service_base, "https://prov.example.org");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config =
            Config::from_toml_str("[github]\ntoken = \"from-file\"\n[store]\npath = \"/a\"\n")
                .unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_GITHUB_TOKEN, "from-env"),
            (ENV_SERVICE_BASE, "http://svc"),
            (ENV_STORE_DIR, ""),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.github_token(), Some("from-env"));
        assert_eq!(config.service_base(), "http://svc");
        // empty values do not override
        assert_eq!(config.store_dir().unwrap(), PathBuf::from("/a"));
    }

    #[test]
    fn test_unknown_resolver() {
        let config = Config::from_toml_str("[provenance]\nresolver = \"sometimes\"\n").unwrap();
        assert!(config.resolver().is_err());
        assert!(config.build_options().is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[github\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.toml"));
    }
}
