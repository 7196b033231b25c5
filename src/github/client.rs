//! Thin async client for the GitHub REST v3 API.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ToolError, ToolResult};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const PAGE_SIZE: usize = 100;

/// Safety stop for pagination on very large accounts.
const MAX_PAGES: usize = 50;

pub struct GitHubClient {
    token: String,
    api_base: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(token: String, api_base: Option<String>) -> Self {
        Self {
            token,
            api_base: api_base
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: reqwest::Client::new(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(
                "User-Agent",
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            )
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ToolResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }
        Ok(response.json().await?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ToolResult<T> {
        tracing::debug!(path, "GitHub GET");
        self.send(self.request(Method::GET, path).query(query)).await
    }

    /// Follow `page=N` until a short page comes back.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ToolResult<Vec<T>> {
        self.get_pages(path, query, MAX_PAGES).await
    }

    async fn get_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        max_pages: usize,
    ) -> ToolResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=max_pages {
            let mut params = query.to_vec();
            params.push(("per_page", PAGE_SIZE.to_string()));
            params.push(("page", page.to_string()));

            let batch: Vec<T> = self.get(path, &params).await?;
            let done = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if done {
                return Ok(items);
            }
        }
        tracing::warn!(
            path,
            pages = max_pages,
            items = items.len(),
            "page limit reached, remaining results dropped"
        );
        Ok(items)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ToolResult<T> {
        tracing::debug!(path, "GitHub POST");
        self.send(self.request(Method::POST, path).json(body)).await
    }
}

/// Build an error from a non-2xx response, preferring GitHub's `message`.
pub fn api_error(status: StatusCode, body: &str) -> ToolError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    ToolError::GitHub {
        status: status.as_u16(),
        message,
    }
}
