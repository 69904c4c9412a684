// src/bin/branch_creator.rs
use anyhow::{Context, Result};
use clap::Parser;
use gh_workflow::cli::init_logging;
use gh_workflow::git::SystemGit;
use gh_workflow::scripts::branch::{self, BranchRequest};

#[derive(Parser)]
#[command(name = "branch-creator")]
#[command(about = "Create a new Git branch from a base branch")]
struct Cli {
    /// Name of the new branch to create
    branch_name: String,
    /// Base branch to create from
    #[arg(long, default_value = "main")]
    base: String,
    /// Remote to fetch the base from and push to
    #[arg(long, default_value = "origin")]
    remote: String,
    /// Push the new branch to the remote after creation
    #[arg(long)]
    push: bool,
    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let git = SystemGit::new(cwd);

    let request = BranchRequest {
        name: cli.branch_name,
        base: cli.base,
        remote: cli.remote,
        push: cli.push,
    };
    branch::create_branch(&git, &request)?;
    Ok(())
}
