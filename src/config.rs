//! Configuration management for universal-mcp.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file,
//! environment variables (a `.env` file is loaded into the environment
//! beforehand), then command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::database::DEFAULT_HISTORY_CAPACITY;
use crate::documents::DEFAULT_MAX_DOCUMENT_BYTES;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Kept for network transports; stdio ignores it.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data.db")
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".universal-mcp").join("config.toml"))
    }

    /// Load `explicit`, or the default config file when it exists, then
    /// apply environment overrides.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment-style overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(api_base) = get("GITHUB_API_BASE") {
            self.github.api_base = Some(api_base);
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT") {
            self.server.port = parse_number("SERVER_PORT", &port)?;
        }
        if let Some(debug) = get("DEBUG") {
            self.server.debug = debug.trim().eq_ignore_ascii_case("true");
        }
        if let Some(capacity) = get("QUERY_HISTORY_CAPACITY") {
            self.database.history_capacity = parse_number("QUERY_HISTORY_CAPACITY", &capacity)?;
        }
        if let Some(max_bytes) = get("MAX_DOCUMENT_BYTES") {
            self.documents.max_bytes = parse_number("MAX_DOCUMENT_BYTES", &max_bytes)?;
        }
        Ok(())
    }

    /// A non-blank token, when one is configured.
    pub fn github_token(&self) -> Option<&str> {
        self.github
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_github_token(&self) -> bool {
        self.github_token().is_some()
    }

    /// TOML rendering with the GitHub token masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.has_github_token() {
            shown.github.token = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).context("Failed to serialize config")
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: '{}'", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, PathBuf::from("./data.db"));
        assert_eq!(config.database.history_capacity, 100);
        assert_eq!(config.documents.max_bytes, 50 * 1024 * 1024);
        assert!(!config.has_github_token());
    }

    #[test]
    fn test_env_overrides_apply() {
        let vars = env(&[
            ("GITHUB_TOKEN", "ghp_abc"),
            ("DATABASE_PATH", "/tmp/x.db"),
            ("SERVER_PORT", "9001"),
            ("DEBUG", "TRUE"),
            ("QUERY_HISTORY_CAPACITY", "5"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.github_token(), Some("ghp_abc"));
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.server.port, 9001);
        assert!(config.server.debug);
        assert_eq!(config.database.history_capacity, 5);
    }

    #[test]
    fn test_malformed_number_is_error() {
        let vars = env(&[("SERVER_PORT", "eighty")]);
        let mut config = AppConfig::default();
        let err = config.apply_overrides(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let vars = env(&[("GITHUB_TOKEN", "   ")]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| vars.get(k).cloned()).unwrap();
        assert!(!config.has_github_token());
    }

    #[test]
    fn test_partial_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database]\npath = \"/srv/app.db\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/srv/app.db"));
        assert_eq!(config.database.history_capacity, 100);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = AppConfig::load(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_redacted_output_hides_token() {
        let mut config = AppConfig::default();
        config.github.token = Some("ghp_secret".to_string());
        let shown = config.to_redacted_toml().unwrap();
        assert!(!shown.contains("ghp_secret"));
        assert!(shown.contains("********"));
    }
}
