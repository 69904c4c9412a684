// src/config.rs
//! Runtime settings shared by the three tools

use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_edit::{DocumentMut, Item};

pub const DEFAULT_OWNER: &str = "canstralian";
pub const DEFAULT_REPO: &str = "Stone-Legacy";
pub const DEFAULT_REST_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

const CONFIG_DIR_NAME: &str = "gh-workflow";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Which GraphQL root owns the project boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    User,
    Organization,
}

impl OwnerKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "user" => Ok(OwnerKind::User),
            "org" | "organization" => Ok(OwnerKind::Organization),
            other => anyhow::bail!("Unknown owner_type '{}' (expected 'user' or 'organization')", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub name: String,
}

impl RepoTarget {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self { owner: owner.into(), name: name.into() }
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub rest_url: String,
    pub graphql_url: String,
    pub api_version: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub repo: RepoTarget,
    pub owner_kind: OwnerKind,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub batch_delay_ms: u64,
    pub token_env: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: RepoTarget::new(DEFAULT_OWNER, DEFAULT_REPO),
            owner_kind: OwnerKind::User,
            api: ApiConfig {
                rest_url: DEFAULT_REST_URL.to_string(),
                graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
                api_version: DEFAULT_API_VERSION.to_string(),
                timeout_ms: 30_000,
            },
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1_000,
            },
            batch_delay_ms: 1_000,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub org: bool,
}

impl Settings {
    /// Resolve settings: defaults, then the config file, then `overrides`.
    ///
    /// An explicit `config_path` must exist. Without one, the per-user file
    /// under the platform config directory is read if it is there.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut settings = Settings::default();

        let path = match config_path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file {:?} does not exist", p);
                }
                Some(p.to_path_buf())
            }
            None => Self::default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            settings
                .merge_toml(&content)
                .with_context(|| format!("Invalid config file {:?}", path))?;
        }

        settings.apply(overrides);
        settings.validate()?;
        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(owner) = &overrides.owner {
            self.repo.owner = owner.clone();
        }
        if let Some(repo) = &overrides.repo {
            self.repo.name = repo.clone();
        }
        if overrides.org {
            self.owner_kind = OwnerKind::Organization;
        }
    }

    /// Overlay values from a TOML document onto these settings.
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let doc = content
            .parse::<DocumentMut>()
            .context("Failed to parse TOML")?;

        if let Some(v) = str_key(&doc, "repository", "owner")? {
            self.repo.owner = v;
        }
        if let Some(v) = str_key(&doc, "repository", "name")? {
            self.repo.name = v;
        }
        if let Some(v) = str_key(&doc, "repository", "owner_type")? {
            self.owner_kind = OwnerKind::parse(&v)?;
        }

        if let Some(v) = str_key(&doc, "api", "rest_url")? {
            self.api.rest_url = v;
        }
        if let Some(v) = str_key(&doc, "api", "graphql_url")? {
            self.api.graphql_url = v;
        }
        if let Some(v) = str_key(&doc, "api", "api_version")? {
            self.api.api_version = v;
        }
        if let Some(v) = int_key(&doc, "api", "timeout_ms")? {
            self.api.timeout_ms = v;
        }

        if let Some(v) = int_key(&doc, "retry", "max_attempts")? {
            self.retry.max_attempts = u32::try_from(v).context("retry.max_attempts is too large")?;
        }
        if let Some(v) = int_key(&doc, "retry", "base_delay_ms")? {
            self.retry.base_delay_ms = v;
        }

        if let Some(v) = int_key(&doc, "batch", "delay_ms")? {
            self.batch_delay_ms = v;
        }

        if let Some(v) = str_key(&doc, "auth", "token_env")? {
            self.token_env = v;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.repo.owner.trim().is_empty() {
            anyhow::bail!("Repository owner cannot be empty");
        }
        if self.repo.name.trim().is_empty() {
            anyhow::bail!("Repository name cannot be empty");
        }
        if self.api.rest_url.trim().is_empty() || self.api.graphql_url.trim().is_empty() {
            anyhow::bail!("API URLs cannot be empty");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be greater than 0");
        }
        if self.token_env.trim().is_empty() {
            anyhow::bail!("auth.token_env cannot be empty");
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }
}

fn lookup<'a>(doc: &'a DocumentMut, table: &str, key: &str) -> Option<&'a Item> {
    doc.get(table).and_then(|t| t.get(key))
}

fn str_key(doc: &DocumentMut, table: &str, key: &str) -> Result<Option<String>> {
    match lookup(doc, table, key) {
        None => Ok(None),
        Some(item) => item
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| anyhow::anyhow!("{}.{} must be a string", table, key)),
    }
}

fn int_key(doc: &DocumentMut, table: &str, key: &str) -> Result<Option<u64>> {
    match lookup(doc, table, key) {
        None => Ok(None),
        Some(item) => {
            let raw = item
                .as_integer()
                .ok_or_else(|| anyhow::anyhow!("{}.{} must be an integer", table, key))?;
            u64::try_from(raw)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("{}.{} must not be negative", table, key))
        }
    }
}
