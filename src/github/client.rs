// src/github/client.rs
//! Authenticated REST and GraphQL calls against one repository

use super::error::ApiError;
use super::retry::RetryPolicy;
use super::types::{
    AddLabels, CreatedIssue, GraphQlRequest, GraphQlResponse, IssueNode, IssueSummary, Label, NewIssue,
    ProjectBoard,
};
use crate::config::{ApiConfig, OwnerKind, RepoTarget, Settings};
use crate::credentials::CredentialProvider;
use anyhow::Context;
use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("gh-workflow/", env!("CARGO_PKG_VERSION"));
const ISSUES_PER_PAGE: usize = 100;
const PROJECTS_PAGE_SIZE: u32 = 20;

const LIST_PROJECTS_USER: &str = r#"
query($owner: String!, $first: Int!, $after: String) {
    owner: user(login: $owner) {
        projectsV2(first: $first, after: $after) {
            nodes { id title number closed }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

const LIST_PROJECTS_ORG: &str = r#"
query($owner: String!, $first: Int!, $after: String) {
    owner: organization(login: $owner) {
        projectsV2(first: $first, after: $after) {
            nodes { id title number closed }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

const FIND_ISSUE: &str = r#"
query($owner: String!, $repo: String!, $number: Int!) {
    repository(owner: $owner, name: $repo) {
        issue(number: $number) { id title }
    }
}
"#;

const ADD_PROJECT_ITEM: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
    addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
        item { id }
    }
}
"#;

/// Holds the bearer token for the lifetime of the process; never printed.
pub struct GitHubClient {
    http: Client,
    repo: RepoTarget,
    api: ApiConfig,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// Reads the token once from `credentials` and bakes it into the default headers.
    pub fn new(settings: &Settings, credentials: &dyn CredentialProvider) -> anyhow::Result<Self> {
        let token = credentials.bearer_token()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("API token contains characters that are not allowed in a header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_str(&settings.api.api_version).context("Invalid API version header")?,
        );

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()
            .context("Failed to build HTTP client for GitHub")?;
        debug!("HTTP client built with timeout: {}ms", settings.api.timeout_ms);

        Ok(Self {
            http,
            repo: settings.repo.clone(),
            api: settings.api.clone(),
            retry: RetryPolicy::new(
                settings.retry.max_attempts,
                Duration::from_millis(settings.retry.base_delay_ms),
                ApiError::is_rate_limited,
            ),
        })
    }

    pub fn repo(&self) -> &RepoTarget {
        &self.repo
    }

    fn repo_url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api.rest_url.trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            endpoint.trim_start_matches('/')
        )
    }

    /// One REST call against the configured repository, retried per the policy.
    pub async fn rest<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let url = self.repo_url(endpoint);
        self.retry
            .execute(|| self.rest_once(method.clone(), &url, query, body))
            .await
    }

    async fn rest_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        info!("Sending {} request to URL: {}", method, url);
        let mut request = self.http.request(method, url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let text = read_success(response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// One GraphQL call; an `errors` list in a 200 response is still a failure.
    pub async fn graphql(&self, query: &str, variables: Option<Value>) -> Result<Value, ApiError> {
        let payload = GraphQlRequest { query, variables };
        self.retry.execute(|| self.graphql_once(&payload)).await
    }

    async fn graphql_once(&self, payload: &GraphQlRequest<'_>) -> Result<Value, ApiError> {
        info!("Sending GraphQL request to URL: {}", self.api.graphql_url);
        let response = self.http.post(&self.api.graphql_url).json(payload).send().await?;
        let text = read_success(response).await?;
        let parsed: GraphQlResponse = serde_json::from_str(&text)?;

        if let Some(errors) = parsed.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            error!("GraphQL responded with errors: {:?}", messages);
            return Err(ApiError::GraphQl(messages));
        }
        parsed
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| ApiError::MissingData("data".to_string()))
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, ApiError> {
        let body = serde_json::to_value(issue)?;
        self.rest(Method::POST, "issues", &[], Some(&body)).await
    }

    /// All open issues carrying `label`, following pages until a short one.
    pub async fn list_open_issues(&self, label: &str) -> Result<Vec<IssueSummary>, ApiError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let query = [
                ("labels", label.to_string()),
                ("state", "open".to_string()),
                ("per_page", ISSUES_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let batch: Vec<IssueSummary> = self.rest(Method::GET, "issues", &query, None).await?;
            let done = batch.len() < ISSUES_PER_PAGE;
            all.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        debug!("Fetched {} open issues labelled '{}'", all.len(), label);
        Ok(all)
    }

    pub async fn add_labels(&self, number: u64, labels: &[String]) -> Result<Vec<Label>, ApiError> {
        let body = serde_json::to_value(AddLabels {
            labels: labels.to_vec(),
        })?;
        self.rest(Method::POST, &format!("issues/{}/labels", number), &[], Some(&body))
            .await
    }

    /// Every project board of the owner, following GraphQL cursors page by page.
    pub async fn list_projects(&self, kind: OwnerKind) -> Result<Vec<ProjectBoard>, ApiError> {
        let query = match kind {
            OwnerKind::User => LIST_PROJECTS_USER,
            OwnerKind::Organization => LIST_PROJECTS_ORG,
        };

        let mut all = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let data = self
                .graphql(
                    query,
                    Some(json!({
                        "owner": self.repo.owner,
                        "first": PROJECTS_PAGE_SIZE,
                        "after": after,
                    })),
                )
                .await?;

            let owner = data.get("owner").filter(|o| !o.is_null()).ok_or_else(|| {
                ApiError::MissingData(format!("no {:?} account named '{}'", kind, self.repo.owner))
            })?;
            let nodes = owner
                .pointer("/projectsV2/nodes")
                .cloned()
                .ok_or_else(|| ApiError::MissingData("projectsV2.nodes".to_string()))?;
            let page: Vec<ProjectBoard> = serde_json::from_value(nodes)?;
            all.extend(page);

            let has_next = owner
                .pointer("/projectsV2/pageInfo/hasNextPage")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let cursor = owner
                .pointer("/projectsV2/pageInfo/endCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            match cursor {
                Some(cursor) if has_next => after = Some(cursor),
                _ => break,
            }
        }
        debug!("Fetched {} projects for '{}'", all.len(), self.repo.owner);
        Ok(all)
    }

    /// Resolve an issue number to its GraphQL node; `None` when the repository has no such issue.
    pub async fn find_issue_node(&self, number: u64) -> Result<Option<IssueNode>, ApiError> {
        let data = self
            .graphql(
                FIND_ISSUE,
                Some(json!({
                    "owner": self.repo.owner,
                    "repo": self.repo.name,
                    "number": number,
                })),
            )
            .await?;

        match data.pointer("/repository/issue") {
            None | Some(Value::Null) => Ok(None),
            Some(node) => Ok(Some(serde_json::from_value(node.clone())?)),
        }
    }

    /// Link a content node to a project board and return the new item's id.
    pub async fn add_project_item(&self, project_id: &str, content_id: &str) -> Result<String, ApiError> {
        let data = self
            .graphql(
                ADD_PROJECT_ITEM,
                Some(json!({ "projectId": project_id, "contentId": content_id })),
            )
            .await?;

        data.pointer("/addProjectV2ItemById/item/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::MissingData("addProjectV2ItemById.item.id".to_string()))
    }
}

/// Body text of a 2xx response, or the classified error for anything else.
async fn read_success(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    debug!("Received response status: {}", status);
    if status.is_success() {
        return Ok(response.text().await?);
    }

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let remaining = header("x-ratelimit-remaining");
    let reset = header("x-ratelimit-reset");
    let body = response.text().await.unwrap_or_else(|_| "N/A".to_string());

    let err = ApiError::from_response(status, body, remaining.as_deref(), reset.as_deref());
    if !err.is_rate_limited() {
        error!("GitHub responded with HTTP {}: {}", status, err);
    }
    Err(err)
}
