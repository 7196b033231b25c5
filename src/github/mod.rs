//! Project manager: repository, issue and user operations on GitHub.
//!
//! Each method is one or more direct REST round trips. Nothing is cached and
//! nothing is retried.

pub mod client;
pub mod models;

use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::error::{ToolError, ToolResult};
pub use client::GitHubClient;
use models::{
    Comment, CommentInfo, Contributor, ContributorInfo, CreatedIssue, Issue, IssueDetails,
    IssueSummary, Release, ReleaseInfo, Repository, RepositoryDetails, RepositorySummary,
    UserProfile,
};

const ISSUE_STATES: [&str; 3] = ["open", "closed", "all"];
const RECENT_RELEASES: usize = 5;

#[derive(Debug, Serialize)]
pub struct RepositoryList {
    pub target: String,
    pub total_repositories: usize,
    pub repositories: Vec<RepositorySummary>,
}

#[derive(Debug, Serialize)]
pub struct RepositoryInfo {
    pub repository: RepositoryDetails,
}

#[derive(Debug, Serialize)]
pub struct IssueList {
    pub repository: String,
    pub state: String,
    pub total_issues: usize,
    pub issues: Vec<IssueSummary>,
}

#[derive(Debug, Serialize)]
pub struct IssueCreated {
    pub repository: String,
    pub issue: CreatedIssue,
}

#[derive(Debug, Serialize)]
pub struct IssueInfo {
    pub repository: String,
    pub issue: IssueDetails,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub user: UserProfile,
}

pub struct ProjectManager {
    client: GitHubClient,
}

impl ProjectManager {
    pub fn new(token: String, api_base: Option<String>) -> Self {
        Self {
            client: GitHubClient::new(token, api_base),
        }
    }

    async fn authenticated_user(&self) -> ToolResult<UserProfile> {
        self.client.get("/user", &[]).await
    }

    /// `owner/repo`, using the authenticated login when `owner` is omitted.
    async fn full_name(&self, repo_name: &str, owner: Option<&str>) -> ToolResult<String> {
        let repo_name = repo_name.trim();
        if repo_name.is_empty() {
            return Err(ToolError::invalid("Repository name cannot be empty"));
        }
        if let Some((owner, repo)) = repo_name.split_once('/') {
            if is_given(owner) && !repo.is_empty() {
                return Ok(repo_name.to_string());
            }
        }
        let owner = match owner.filter(|o| is_given(o)) {
            Some(o) => o.trim().to_string(),
            None => self.authenticated_user().await?.login,
        };
        Ok(format!("{}/{}", owner, repo_name))
    }

    pub async fn list_repositories(
        &self,
        username: Option<&str>,
        organization: Option<&str>,
    ) -> ToolResult<RepositoryList> {
        let (path, target) = if let Some(org) = organization.filter(|o| is_given(o)) {
            (format!("/orgs/{}/repos", org.trim()), format!("organization '{}'", org.trim()))
        } else if let Some(user) = username.filter(|u| is_given(u)) {
            (format!("/users/{}/repos", user.trim()), format!("user '{}'", user.trim()))
        } else {
            let me = self.authenticated_user().await?;
            ("/user/repos".to_string(), format!("authenticated user '{}'", me.login))
        };

        let repos: Vec<Repository> = self.client.get_all(&path, &[]).await?;
        let repositories: Vec<RepositorySummary> =
            repos.into_iter().map(RepositorySummary::from).collect();
        Ok(RepositoryList {
            target,
            total_repositories: repositories.len(),
            repositories,
        })
    }

    pub async fn get_repository_info(
        &self,
        repo_name: &str,
        owner: Option<&str>,
    ) -> ToolResult<RepositoryInfo> {
        let full_name = self.full_name(repo_name, owner).await?;
        let base = format!("/repos/{}", full_name);

        let repo: Repository = self.client.get(&base, &[]).await?;
        let branches: Vec<models::Named> =
            self.client.get_all(&format!("{}/branches", base), &[]).await?;

        let contributors: Vec<ContributorInfo> = match self
            .client
            .get_all::<Contributor>(&format!("{}/contributors", base), &[])
            .await
        {
            Ok(list) => list.into_iter().map(ContributorInfo::from).collect(),
            Err(e) => {
                warn!(repo = %full_name, error = %e, "contributors unavailable");
                Vec::new()
            }
        };

        let releases: Vec<ReleaseInfo> = match self
            .client
            .get::<Vec<Release>>(
                &format!("{}/releases", base),
                &[("per_page", RECENT_RELEASES.to_string())],
            )
            .await
        {
            Ok(list) => list
                .into_iter()
                .take(RECENT_RELEASES)
                .map(ReleaseInfo::from)
                .collect(),
            Err(e) => {
                warn!(repo = %full_name, error = %e, "releases unavailable");
                Vec::new()
            }
        };

        Ok(RepositoryInfo {
            repository: RepositoryDetails::new(
                repo,
                branches.into_iter().map(|b| b.name).collect(),
                contributors,
                releases,
            ),
        })
    }

    pub async fn list_issues(
        &self,
        repo_name: &str,
        owner: Option<&str>,
        state: Option<&str>,
    ) -> ToolResult<IssueList> {
        let full_name = self.full_name(repo_name, owner).await?;
        let state = normalize_state(state);

        let issues: Vec<Issue> = self
            .client
            .get_all(
                &format!("/repos/{}/issues", full_name),
                &[("state", state.to_string())],
            )
            .await?;
        let issues = without_pull_requests(issues);

        Ok(IssueList {
            repository: full_name,
            state: state.to_string(),
            total_issues: issues.len(),
            issues,
        })
    }

    pub async fn create_issue(
        &self,
        repo_name: &str,
        title: &str,
        body: Option<&str>,
        owner: Option<&str>,
    ) -> ToolResult<IssueCreated> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ToolError::invalid("Issue title cannot be empty"));
        }
        let full_name = self.full_name(repo_name, owner).await?;

        let mut payload = json!({ "title": title });
        if let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) {
            payload["body"] = json!(body);
        }
        let issue: Issue = self
            .client
            .post(&format!("/repos/{}/issues", full_name), &payload)
            .await?;
        tracing::info!(repo = %full_name, number = issue.number, "created issue");

        Ok(IssueCreated {
            repository: full_name,
            issue: CreatedIssue::from(issue),
        })
    }

    pub async fn get_issue(
        &self,
        repo_name: &str,
        issue_number: u64,
        owner: Option<&str>,
    ) -> ToolResult<IssueInfo> {
        let full_name = self.full_name(repo_name, owner).await?;
        let path = format!("/repos/{}/issues/{}", full_name, issue_number);

        let issue: Issue = self.client.get(&path, &[]).await?;
        let comments: Vec<Comment> = self
            .client
            .get_all(&format!("{}/comments", path), &[])
            .await?;

        Ok(IssueInfo {
            repository: full_name,
            issue: IssueDetails::new(
                issue,
                comments.into_iter().map(CommentInfo::from).collect(),
            ),
        })
    }

    pub async fn get_user_info(&self, username: Option<&str>) -> ToolResult<UserInfo> {
        let user: UserProfile = match username.filter(|u| is_given(u)) {
            Some(name) => {
                self.client
                    .get(&format!("/users/{}", name.trim()), &[])
                    .await?
            }
            None => self.authenticated_user().await?,
        };
        Ok(UserInfo { user })
    }
}

fn is_given(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `open`, `closed` or `all`; anything else means `open`.
pub fn normalize_state(state: Option<&str>) -> &'static str {
    let wanted = state.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
    ISSUE_STATES
        .iter()
        .copied()
        .find(|s| *s == wanted)
        .unwrap_or("open")
}

/// GitHub lists pull requests as issues; keep only real issues.
pub fn without_pull_requests(issues: Vec<Issue>) -> Vec<IssueSummary> {
    issues
        .into_iter()
        .filter(|i| !i.is_pull_request())
        .map(IssueSummary::from)
        .collect()
}
