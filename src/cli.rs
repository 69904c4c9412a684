// src/cli.rs
//! Flags shared by the binaries

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use crate::config::{Overrides, Settings};

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Repository owner (user or organization)
    #[arg(long, global = true, env = "GH_WORKFLOW_OWNER")]
    pub owner: Option<String>,
    /// Repository name
    #[arg(long, global = true, env = "GH_WORKFLOW_REPO")]
    pub repo: Option<String>,
    /// Path to a config.toml (defaults to the per-user config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn settings(&self, org: bool) -> Result<Settings> {
        let overrides = Overrides {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            org,
        };
        Settings::load(self.config.as_deref(), &overrides)
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}
