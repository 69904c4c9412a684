// src/scripts/issues.rs
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::github::types::{CreatedIssue, NewIssue};
use crate::github::GitHubClient;

/// Split a comma-separated flag value, dropping blanks.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn create_issue(client: &GitHubClient, issue: &NewIssue) -> Result<CreatedIssue> {
    if issue.title.trim().is_empty() {
        anyhow::bail!("Issue title cannot be empty");
    }

    info!("Creating issue '{}' in {}", issue.title, client.repo().slug());
    let created = client
        .create_issue(issue)
        .await
        .with_context(|| format!("Failed to create issue '{}'", issue.title))?;
    println!("Created: {}", created.html_url);
    Ok(created)
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Option<Vec<String>>,
    #[serde(default)]
    assignees: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// Records from a batch file that are ready to send, in file order, plus the ones left out.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub issues: Vec<(usize, NewIssue)>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub created: Vec<CreatedIssue>,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse a batch file body. The top level must be a JSON array; individual
/// bad records are skipped rather than failing the whole file.
pub fn plan_batch(content: &str) -> Result<BatchPlan> {
    let parsed: Value = serde_json::from_str(content).context("Batch file is not valid JSON")?;
    let records = match parsed {
        Value::Array(records) => records,
        _ => anyhow::bail!("JSON file must contain an array of issues."),
    };

    let mut plan = BatchPlan::default();
    for (index, raw) in records.into_iter().enumerate() {
        match serde_json::from_value::<IssueRecord>(raw) {
            Ok(IssueRecord { title: Some(title), body, labels, assignees }) if !title.trim().is_empty() => {
                plan.issues.push((
                    index,
                    NewIssue {
                        title,
                        body: body.unwrap_or_default(),
                        labels: labels.unwrap_or_default(),
                        assignees: assignees.unwrap_or_default(),
                    },
                ));
            }
            Ok(_) => plan.skipped.push(SkippedRecord {
                index,
                reason: "missing 'title' field".to_string(),
            }),
            Err(e) => plan.skipped.push(SkippedRecord {
                index,
                reason: format!("malformed record ({})", e),
            }),
        }
    }
    Ok(plan)
}

/// Create every valid record in `path`, pausing `delay` between creations.
/// Any API failure aborts the run.
pub async fn create_batch(client: &GitHubClient, path: &Path, delay: Duration) -> Result<BatchReport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {:?}", path))?;
    let plan = plan_batch(&content)?;

    for skipped in &plan.skipped {
        warn!("Skipping record {}: {}", skipped.index, skipped.reason);
        eprintln!("Skipping issue {}: {}.", skipped.index, skipped.reason);
    }

    let mut report = BatchReport {
        created: Vec::with_capacity(plan.issues.len()),
        skipped: plan.skipped,
    };

    for (position, (index, issue)) in plan.issues.iter().enumerate() {
        if position > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let created = create_issue(client, issue)
            .await
            .with_context(|| format!("Batch aborted at record {}", index))?;
        report.created.push(created);
    }

    println!(
        "Created {} issue(s), skipped {} record(s).",
        report.created.len(),
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::test_support::client_for;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn test_split_csv_drops_blanks() {
        assert_eq!(split_csv(" bug, urgent ,,"), vec!["bug".to_string(), "urgent".to_string()]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_plan_batch_skips_records_without_title() {
        let plan = plan_batch(r#"[{"title":"A"}, {}, {"title":"B", "labels": ["bug"]}]"#).unwrap();
        let titles: Vec<&str> = plan.issues.iter().map(|(_, i)| i.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(plan.issues[1].0, 2);
        assert_eq!(plan.issues[1].1.labels, vec!["bug".to_string()]);
        assert_eq!(
            plan.skipped,
            vec![SkippedRecord { index: 1, reason: "missing 'title' field".to_string() }]
        );
    }

    #[test]
    fn test_plan_batch_skips_blank_titles_and_non_objects() {
        let plan = plan_batch(r#"[{"title":"   "}, 42, {"title":"ok","labels":"bug"}, {"title":"fine"}]"#).unwrap();
        assert_eq!(plan.issues.len(), 1);
        assert_eq!(plan.issues[0].1.title, "fine");
        let skipped: Vec<usize> = plan.skipped.iter().map(|s| s.index).collect();
        assert_eq!(skipped, vec![0, 1, 2]);
    }

    #[test]
    fn test_plan_batch_rejects_non_array_top_level() {
        let err = plan_batch(r#"{"title":"A"}"#).unwrap_err();
        assert!(err.to_string().contains("must contain an array"));
        assert!(plan_batch("not json").is_err());
    }

    #[tokio::test]
    async fn test_create_batch_creates_exactly_the_titled_records() {
        let mut server = Server::new_async().await;
        let a = server
            .mock("POST", "/repos/octo/demo/issues")
            .match_body(Matcher::PartialJson(json!({"title": "A"})))
            .with_status(201)
            .with_body(r#"{"number": 1, "html_url": "https://github.com/octo/demo/issues/1"}"#)
            .expect(1)
            .create_async()
            .await;
        let b = server
            .mock("POST", "/repos/octo/demo/issues")
            .match_body(Matcher::PartialJson(json!({"title": "B"})))
            .with_status(201)
            .with_body(r#"{"number": 2, "html_url": "https://github.com/octo/demo/issues/2"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.json");
        fs::write(&path, r#"[{"title":"A"}, {}, {"title":"B"}]"#).unwrap();

        let client = client_for(&server.url());
        let report = create_batch(&client, &path, Duration::ZERO).await.unwrap();

        assert_eq!(report.created.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        a.assert_async().await;
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_batch_stops_on_api_error() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("POST", "/repos/octo/demo/issues")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.json");
        fs::write(&path, r#"[{"title":"A"}, {"title":"B"}]"#).unwrap();

        let client = client_for(&server.url());
        let err = create_batch(&client, &path, Duration::ZERO).await.unwrap_err();

        assert!(format!("{:#}", err).contains("Batch aborted at record 0"));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_issue_rejects_blank_title_without_calling_api() {
        let mut server = Server::new_async().await;
        let never = server
            .mock("POST", "/repos/octo/demo/issues")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let issue = NewIssue {
            title: " ".to_string(),
            body: String::new(),
            labels: vec![],
            assignees: vec![],
        };
        assert!(create_issue(&client, &issue).await.is_err());
        never.assert_async().await;
    }
}
