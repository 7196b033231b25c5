//! Components shared by every tool, built once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::database::DatabaseConnector;
use crate::documents::DocumentReader;
use crate::files::FileBrowser;
use crate::github::ProjectManager;

pub struct AppState {
    pub config: AppConfig,
    pub database: Arc<DatabaseConnector>,
    pub documents: Arc<DocumentReader>,
    pub files: Arc<FileBrowser>,
    /// Present only when a GitHub token is configured.
    pub github: Option<Arc<ProjectManager>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let database = DatabaseConnector::open(
            &config.database.path,
            config.database.history_capacity,
        )
        .with_context(|| {
            format!(
                "Failed to open database: {}",
                config.database.path.display()
            )
        })?;

        let github = config.github_token().map(|token| {
            Arc::new(ProjectManager::new(
                token.to_string(),
                config.github.api_base.clone(),
            ))
        });

        Ok(Self {
            database: Arc::new(database),
            documents: Arc::new(DocumentReader::new(config.documents.max_bytes)),
            files: Arc::new(FileBrowser::new()),
            github,
            config,
        })
    }

    /// State backed by a database file inside `dir`, without GitHub.
    #[cfg(test)]
    pub fn for_tests(dir: &std::path::Path) -> Self {
        let mut config = AppConfig::default();
        config.database.path = dir.join("test.db");
        config.github.token = None;
        Self::new(config).unwrap()
    }
}
