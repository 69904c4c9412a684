// src/bin/project_manager.rs
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use gh_workflow::cli::{init_logging, GlobalArgs};
use gh_workflow::credentials::EnvCredentials;
use gh_workflow::github::GitHubClient;
use gh_workflow::scripts::{issues::split_csv, projects};

#[derive(Parser)]
#[command(name = "project-manager")]
#[command(about = "Manage GitHub projects and issue organization")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    /// Treat the owner as an organization when listing projects
    #[arg(long, global = true)]
    org: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all GitHub projects of the owner
    ListProjects,
    /// Add an issue to a project
    AddIssue {
        /// ProjectV2 node ID
        #[arg(long)]
        project_id: String,
        /// Issue number
        #[arg(long)]
        issue: u64,
    },
    /// Find open issues by label and optionally add more labels
    LabelIssues {
        /// Label to search for
        #[arg(long)]
        label: String,
        /// Comma-separated labels to add
        #[arg(long, default_value = "")]
        add_labels: String,
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

    let settings = cli.global.settings(cli.org)?;
    let client = GitHubClient::new(&settings, &EnvCredentials::new(&settings.token_env))?;

    match command {
        Commands::ListProjects => {
            projects::list_projects(&client, settings.owner_kind).await?;
        }
        Commands::AddIssue { project_id, issue } => {
            projects::add_issue_to_project(&client, &project_id, issue).await?;
        }
        Commands::LabelIssues { label, add_labels } => {
            projects::label_issues(&client, &label, &split_csv(&add_labels)).await?;
        }
    }

    Ok(())
}
