//! GitHub REST payloads and the shapes returned to callers.
//!
//! Timestamps are kept as the ISO 8601 strings GitHub sends.

use serde::{Deserialize, Serialize};

// --- API Response Types ---

#[derive(Debug, Clone, Deserialize)]
pub struct Login {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Login,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub language: Option<String>,
    #[serde(default)]
    pub size: u64,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub html_url: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<Named>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub user: Option<Login>,
    #[serde(default)]
    pub assignees: Vec<Login>,
    #[serde(default)]
    pub labels: Vec<Named>,
    pub milestone: Option<Milestone>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    pub html_url: Option<String>,
    /// Present only when the "issue" is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user: Option<Login>,
    pub body: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// `/user` and `/users/{name}` share this shape, so it is returned as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
}

// --- Output Types ---

#[derive(Debug, Clone, Serialize)]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub issues: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
}

impl From<Repository> for RepositorySummary {
    fn from(repo: Repository) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            private: repo.private,
            fork: repo.fork,
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            issues: repo.open_issues_count,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            clone_url: repo.clone_url,
            html_url: repo.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributorInfo {
    pub login: String,
    pub contributions: u64,
    pub avatar_url: Option<String>,
}

impl From<Contributor> for ContributorInfo {
    fn from(c: Contributor) -> Self {
        Self {
            login: c.login,
            contributions: c.contributions,
            avatar_url: c.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    pub name: Option<String>,
    pub published_at: Option<String>,
    pub prerelease: bool,
    pub draft: bool,
}

impl From<Release> for ReleaseInfo {
    fn from(r: Release) -> Self {
        Self {
            tag_name: r.tag_name,
            name: r.name,
            published_at: r.published_at,
            prerelease: r.prerelease,
            draft: r.draft,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryDetails {
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub description: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub language: Option<String>,
    pub size: u64,
    pub default_branch: Option<String>,
    pub branches: Vec<String>,
    pub stars: u64,
    pub watchers: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub contributors: Vec<ContributorInfo>,
    pub releases: Vec<ReleaseInfo>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub html_url: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub topics: Vec<String>,
    pub archived: bool,
    pub disabled: bool,
}

impl RepositoryDetails {
    pub fn new(
        repo: Repository,
        branches: Vec<String>,
        contributors: Vec<ContributorInfo>,
        releases: Vec<ReleaseInfo>,
    ) -> Self {
        Self {
            name: repo.name,
            full_name: repo.full_name,
            owner: repo.owner.login,
            description: repo.description,
            private: repo.private,
            fork: repo.fork,
            language: repo.language,
            size: repo.size,
            default_branch: repo.default_branch,
            branches,
            stars: repo.stargazers_count,
            watchers: repo.watchers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count,
            contributors,
            releases,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            clone_url: repo.clone_url,
            ssh_url: repo.ssh_url,
            html_url: repo.html_url,
            homepage: repo.homepage,
            license: repo.license.map(|l| l.name),
            topics: repo.topics,
            archived: repo.archived,
            disabled: repo.disabled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub author: Option<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub milestone: Option<String>,
    pub comments: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    pub html_url: Option<String>,
}

impl From<Issue> for IssueSummary {
    fn from(issue: Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state,
            author: issue.user.map(|u| u.login),
            assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            milestone: issue.milestone.map(|m| m.title),
            comments: issue.comments,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            html_url: issue.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub author: Option<String>,
    pub created_at: Option<String>,
    pub html_url: Option<String>,
}

impl From<Issue> for CreatedIssue {
    fn from(issue: Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state,
            author: issue.user.map(|u| u.login),
            created_at: issue.created_at,
            html_url: issue.html_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentInfo {
    pub id: u64,
    pub author: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Comment> for CommentInfo {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author: c.user.map(|u| u.login),
            body: c.body,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueDetails {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub author: Option<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub milestone: Option<String>,
    pub comments_count: u64,
    pub comments: Vec<CommentInfo>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    pub html_url: Option<String>,
}

impl IssueDetails {
    pub fn new(issue: Issue, comments: Vec<CommentInfo>) -> Self {
        let summary = IssueSummary::from(issue);
        Self {
            number: summary.number,
            title: summary.title,
            body: summary.body,
            state: summary.state,
            author: summary.author,
            assignees: summary.assignees,
            labels: summary.labels,
            milestone: summary.milestone,
            comments_count: summary.comments,
            comments,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            closed_at: summary.closed_at,
            html_url: summary.html_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repository_summary_mapping() {
        let repo: Repository = serde_json::from_value(json!({
            "name": "hello",
            "full_name": "octo/hello",
            "owner": { "login": "octo" },
            "description": null,
            "private": false,
            "fork": true,
            "language": "Rust",
            "stargazers_count": 12,
            "forks_count": 3,
            "open_issues_count": 1,
            "html_url": "https://github.com/octo/hello",
            "license": { "key": "mit", "name": "MIT License" }
        }))
        .unwrap();

        let details = RepositoryDetails::new(repo.clone(), vec!["main".into()], vec![], vec![]);
        assert_eq!(details.owner, "octo");
        assert_eq!(details.license.as_deref(), Some("MIT License"));

        let summary = RepositorySummary::from(repo);
        assert_eq!(summary.stars, 12);
        assert_eq!(summary.forks, 3);
        assert!(summary.fork);
        assert_eq!(summary.language.as_deref(), Some("Rust"));
    }

    #[test]
    fn test_issue_mapping() {
        let issue: Issue = serde_json::from_value(json!({
            "number": 7,
            "title": "Crash on start",
            "body": "stack trace",
            "state": "open",
            "user": { "login": "ann" },
            "assignees": [{ "login": "bob" }],
            "labels": [{ "name": "bug" }],
            "milestone": { "title": "v1" },
            "comments": 2
        }))
        .unwrap();
        assert!(!issue.is_pull_request());

        let summary = IssueSummary::from(issue);
        assert_eq!(summary.author.as_deref(), Some("ann"));
        assert_eq!(summary.assignees, vec!["bob"]);
        assert_eq!(summary.labels, vec!["bug"]);
        assert_eq!(summary.milestone.as_deref(), Some("v1"));
    }

    #[test]
    fn test_pull_request_marker() {
        let issue: Issue = serde_json::from_value(json!({
            "number": 8,
            "title": "Add feature",
            "state": "open",
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/8" }
        }))
        .unwrap();
        assert!(issue.is_pull_request());
    }
}
