//! GitHub tools. Registered only when a token is configured.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_params, Tool};
use crate::error::ToolResult;
use crate::github::ProjectManager;

#[derive(Debug, Deserialize)]
struct ListRepositoriesParams {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    organization: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryParams {
    repo_name: String,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListIssuesParams {
    repo_name: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateIssueParams {
    repo_name: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetIssueParams {
    repo_name: String,
    issue_number: u64,
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserParams {
    #[serde(default)]
    username: Option<String>,
}

fn repo_properties() -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(
        "repo_name".to_string(),
        json!({ "type": "string", "description": "Repository name, or 'owner/name'" }),
    );
    properties.insert(
        "owner".to_string(),
        json!({
            "type": "string",
            "description": "Repository owner; defaults to the authenticated user"
        }),
    );
    properties
}

fn object_schema(properties: Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub struct ListRepositoriesTool {
    manager: Arc<ProjectManager>,
}

impl ListRepositoriesTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for ListRepositoriesTool {
    fn name(&self) -> &str {
        "list_repositories"
    }

    fn description(&self) -> &str {
        "List repositories for a user, an organization, or the authenticated user."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "username": {
                    "type": "string",
                    "description": "GitHub username"
                },
                "organization": {
                    "type": "string",
                    "description": "GitHub organization; takes precedence over username"
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: ListRepositoriesParams = parse_params(self.name(), params)?;
        let list = self
            .manager
            .list_repositories(params.username.as_deref(), params.organization.as_deref())
            .await?;
        Ok(serde_json::to_value(list)?)
    }
}

pub struct RepositoryInfoTool {
    manager: Arc<ProjectManager>,
}

impl RepositoryInfoTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for RepositoryInfoTool {
    fn name(&self) -> &str {
        "get_repository_info"
    }

    fn description(&self) -> &str {
        "Get repository details including branches, contributors and recent releases."
    }

    fn parameters_schema(&self) -> Value {
        object_schema(repo_properties(), &["repo_name"])
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: RepositoryParams = parse_params(self.name(), params)?;
        let info = self
            .manager
            .get_repository_info(&params.repo_name, params.owner.as_deref())
            .await?;
        Ok(serde_json::to_value(info)?)
    }
}

pub struct ListIssuesTool {
    manager: Arc<ProjectManager>,
}

impl ListIssuesTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for ListIssuesTool {
    fn name(&self) -> &str {
        "list_issues"
    }

    fn description(&self) -> &str {
        "List issues in a repository. Pull requests are excluded."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = repo_properties();
        properties.insert(
            "state".to_string(),
            json!({
                "type": "string",
                "enum": ["open", "closed", "all"],
                "default": "open"
            }),
        );
        object_schema(properties, &["repo_name"])
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: ListIssuesParams = parse_params(self.name(), params)?;
        let issues = self
            .manager
            .list_issues(
                &params.repo_name,
                params.owner.as_deref(),
                params.state.as_deref(),
            )
            .await?;
        Ok(serde_json::to_value(issues)?)
    }
}

pub struct CreateIssueTool {
    manager: Arc<ProjectManager>,
}

impl CreateIssueTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for CreateIssueTool {
    fn name(&self) -> &str {
        "create_issue"
    }

    fn description(&self) -> &str {
        "Create a new issue in a repository."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = repo_properties();
        properties.insert(
            "title".to_string(),
            json!({ "type": "string", "description": "Issue title" }),
        );
        properties.insert(
            "body".to_string(),
            json!({ "type": "string", "description": "Issue body (Markdown)", "default": "" }),
        );
        object_schema(properties, &["repo_name", "title"])
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: CreateIssueParams = parse_params(self.name(), params)?;
        let created = self
            .manager
            .create_issue(
                &params.repo_name,
                &params.title,
                params.body.as_deref(),
                params.owner.as_deref(),
            )
            .await?;
        Ok(serde_json::to_value(created)?)
    }
}

pub struct GetIssueTool {
    manager: Arc<ProjectManager>,
}

impl GetIssueTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for GetIssueTool {
    fn name(&self) -> &str {
        "get_issue"
    }

    fn description(&self) -> &str {
        "Get one issue with its comments."
    }

    fn parameters_schema(&self) -> Value {
        let mut properties = repo_properties();
        properties.insert(
            "issue_number".to_string(),
            json!({ "type": "integer", "minimum": 1 }),
        );
        object_schema(properties, &["repo_name", "issue_number"])
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: GetIssueParams = parse_params(self.name(), params)?;
        let issue = self
            .manager
            .get_issue(&params.repo_name, params.issue_number, params.owner.as_deref())
            .await?;
        Ok(serde_json::to_value(issue)?)
    }
}

pub struct UserInfoTool {
    manager: Arc<ProjectManager>,
}

impl UserInfoTool {
    pub fn new(manager: Arc<ProjectManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Tool for UserInfoTool {
    fn name(&self) -> &str {
        "get_user_info"
    }

    fn description(&self) -> &str {
        "Get a GitHub user's profile, or the authenticated user's when no username is given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "username": { "type": "string", "description": "GitHub username" }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: UserParams = parse_params(self.name(), params)?;
        let user = self.manager.get_user_info(params.username.as_deref()).await?;
        Ok(serde_json::to_value(user)?)
    }
}
