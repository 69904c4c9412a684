// src/scripts/projects.rs
use anyhow::{Context, Result};
use log::info;
use crate::config::OwnerKind;
use crate::github::types::ProjectBoard;
use crate::github::GitHubClient;

pub async fn list_projects(client: &GitHubClient, kind: OwnerKind) -> Result<Vec<ProjectBoard>> {
    let projects = client
        .list_projects(kind)
        .await
        .with_context(|| format!("Failed to list projects for '{}'", client.repo().owner))?;

    if projects.is_empty() {
        println!("No projects found.");
    } else {
        print!("{}", format_projects_table(&projects));
    }
    Ok(projects)
}

pub fn format_projects_table(projects: &[ProjectBoard]) -> String {
    let mut out = format!("{:<40} {:<5} {:<30} {:<10}\n", "ID", "#", "Title", "Status");
    out.push_str(&"-".repeat(85));
    out.push('\n');
    for p in projects {
        out.push_str(&format!(
            "{:<40} {:<5} {:<30} {:<10}\n",
            p.id,
            p.number,
            p.title,
            p.status()
        ));
    }
    out
}

/// Attach issue `number` to a project board. Returns the new project item id.
///
/// The issue's node id is looked up first; the mutation only runs once that succeeds.
pub async fn add_issue_to_project(client: &GitHubClient, project_id: &str, number: u64) -> Result<String> {
    let issue = client
        .find_issue_node(number)
        .await
        .with_context(|| format!("Failed to look up issue #{}", number))?
        .ok_or_else(|| anyhow::anyhow!("Issue #{} not found in {}", number, client.repo().slug()))?;

    info!("Issue #{} resolved to node {}", number, issue.id);
    let item_id = client
        .add_project_item(project_id, &issue.id)
        .await
        .with_context(|| format!("Failed to add issue #{} to project {}", number, project_id))?;

    println!("Added issue #{} '{}' to project.", number, issue.title);
    Ok(item_id)
}

/// Labels from `requested` that the issue does not carry yet, in request order, without repeats.
pub fn missing_labels(existing: &[String], requested: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in requested {
        if !existing.contains(label) && !out.contains(label) {
            out.push(label.clone());
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct LabelReport {
    pub matched: usize,
    /// `(issue number, labels added)` for every issue that was changed
    pub updated: Vec<(u64, Vec<String>)>,
}

/// List open issues labelled `label` and add any of `add` they are missing.
pub async fn label_issues(client: &GitHubClient, label: &str, add: &[String]) -> Result<LabelReport> {
    let issues = client
        .list_open_issues(label)
        .await
        .with_context(|| format!("Failed to list open issues with label '{}'", label))?;

    let mut report = LabelReport {
        matched: issues.len(),
        ..Default::default()
    };

    if issues.is_empty() {
        println!("No open issues found with label '{}'.", label);
        return Ok(report);
    }

    println!("Found {} open issues with label '{}':", issues.len(), label);
    for issue in &issues {
        println!("  #{}: {}", issue.number, issue.title);

        let new_labels = missing_labels(&issue.label_names(), add);
        if new_labels.is_empty() {
            continue;
        }
        client
            .add_labels(issue.number, &new_labels)
            .await
            .with_context(|| format!("Failed to add labels to issue #{}", issue.number))?;
        println!("    Added labels: {}", new_labels.join(", "));
        report.updated.push((issue.number, new_labels));
    }

    Ok(report)
}
