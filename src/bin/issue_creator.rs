// src/bin/issue_creator.rs
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use gh_workflow::cli::{init_logging, GlobalArgs};
use gh_workflow::credentials::EnvCredentials;
use gh_workflow::github::types::NewIssue;
use gh_workflow::github::GitHubClient;
use gh_workflow::scripts::issues;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "issue-creator")]
#[command(about = "Create GitHub issues via the API")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a single issue
    Create {
        /// Issue title
        #[arg(long)]
        title: String,
        /// Issue body/description
        #[arg(long, default_value = "")]
        body: String,
        /// Comma-separated labels
        #[arg(long, default_value = "")]
        labels: String,
        /// Comma-separated assignees
        #[arg(long, default_value = "")]
        assignees: String,
    },
    /// Create issues from a JSON file
    Batch {
        /// Path to JSON file holding an array of issues
        #[arg(long)]
        file: PathBuf,
        /// Pause between issues in milliseconds (overrides the config file)
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = cli.global.settings(false)?;
    let client = GitHubClient::new(&settings, &EnvCredentials::new(&settings.token_env))?;

    match command {
        Commands::Create { title, body, labels, assignees } => {
            let issue = NewIssue {
                title,
                body,
                labels: issues::split_csv(&labels),
                assignees: issues::split_csv(&assignees),
            };
            issues::create_issue(&client, &issue).await?;
        }
        Commands::Batch { file, delay_ms } => {
            let delay = delay_ms.map(Duration::from_millis).unwrap_or_else(|| settings.batch_delay());
            issues::create_batch(&client, &file, delay).await?;
        }
    }

    Ok(())
}
