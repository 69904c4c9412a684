// src/git.rs
//! Thin wrapper around the `git` executable

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::PathBuf;
use std::process::Command;

/// Captured result of one git invocation.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait Git {
    /// Run `git <args>` and capture its output. A non-zero exit is not an error here.
    fn run(&self, args: &[&str]) -> Result<GitOutput>;

    /// Like `run`, but a non-zero exit becomes an error carrying stderr verbatim.
    fn run_checked(&self, args: &[&str]) -> Result<GitOutput> {
        let output = self.run(args)?;
        if !output.success {
            anyhow::bail!("git {} failed:\n{}", args.join(" "), output.stderr.trim());
        }
        Ok(output)
    }
}

pub struct SystemGit {
    working_dir: PathBuf,
}

impl SystemGit {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

impl Git for SystemGit {
    fn run(&self, args: &[&str]) -> Result<GitOutput> {
        debug!("Running git {:?} in {}", args, self.working_dir.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .context("Failed to launch git. Is it installed and on PATH?")?;

        let result = GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success {
            warn!("git {:?} exited with {}: {}", args, output.status, result.stderr.trim());
        }

        Ok(result)
    }
}
