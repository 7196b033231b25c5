//! File-system tools backed by `FileBrowser`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_params, Tool};
use crate::error::ToolResult;
use crate::files::FileBrowser;

fn current_dir() -> String {
    ".".to_string()
}

fn any_file() -> String {
    "*".to_string()
}

fn one() -> usize {
    1
}

#[derive(Debug, Deserialize)]
struct BrowseParams {
    #[serde(default = "current_dir")]
    path: String,
    #[serde(default)]
    include_hidden: bool,
    #[serde(default = "one")]
    max_depth: usize,
}

#[derive(Debug, Deserialize)]
struct FileInfoParams {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default = "current_dir")]
    directory: String,
    #[serde(default = "any_file")]
    pattern: String,
    #[serde(default)]
    include_content: bool,
}

#[derive(Debug, Deserialize)]
struct CreateDirectoryParams {
    path: String,
}

/// List a directory, optionally recursing.
pub struct BrowseDirectoryTool {
    browser: Arc<FileBrowser>,
}

impl BrowseDirectoryTool {
    pub fn new(browser: Arc<FileBrowser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for BrowseDirectoryTool {
    fn name(&self) -> &str {
        "browse_directory"
    }

    fn description(&self) -> &str {
        "List directory contents with sizes, timestamps and permissions. \
         Directories within max_depth include their children."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list",
                    "default": "."
                },
                "include_hidden": {
                    "type": "boolean",
                    "description": "Include entries whose name starts with a dot",
                    "default": false
                },
                "max_depth": {
                    "type": "integer",
                    "description": "How many levels to list; 1 lists only the directory itself",
                    "default": 1,
                    "minimum": 1
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: BrowseParams = parse_params(self.name(), params)?;
        let listing = self.browser.browse_directory(
            Path::new(&params.path),
            params.include_hidden,
            params.max_depth,
        )?;
        Ok(serde_json::to_value(listing)?)
    }
}

/// Detailed information about one path.
pub struct FileInfoTool {
    browser: Arc<FileBrowser>,
}

impl FileInfoTool {
    pub fn new(browser: Arc<FileBrowser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for FileInfoTool {
    fn name(&self) -> &str {
        "get_file_info"
    }

    fn description(&self) -> &str {
        "Get detailed information about a file or directory: size, permissions, \
         timestamps, checksum and a preview of small text files."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file or directory"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: FileInfoParams = parse_params(self.name(), params)?;
        let details = self.browser.get_file_info(Path::new(&params.file_path))?;
        Ok(serde_json::to_value(details)?)
    }
}

/// Recursive glob search, optionally matching file contents.
pub struct SearchFilesTool {
    browser: Arc<FileBrowser>,
}

impl SearchFilesTool {
    pub fn new(browser: Arc<FileBrowser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }

    fn description(&self) -> &str {
        "Recursively search for files whose name matches a glob pattern. With \
         include_content, a pattern of the form 'glob:text' also searches file contents."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to search in",
                    "default": "."
                },
                "pattern": {
                    "type": "string",
                    "description": "File name glob such as '*.py', or 'glob:text' for content search",
                    "default": "*"
                },
                "include_content": {
                    "type": "boolean",
                    "description": "Search inside text files",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: SearchParams = parse_params(self.name(), params)?;
        let result = self.browser.search_files(
            Path::new(&params.directory),
            &params.pattern,
            params.include_content,
        )?;
        Ok(serde_json::to_value(result)?)
    }
}

/// Create a directory and its parents.
pub struct CreateDirectoryTool {
    browser: Arc<FileBrowser>,
}

impl CreateDirectoryTool {
    pub fn new(browser: Arc<FileBrowser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Create a new directory, including any missing parent directories."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to create"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: CreateDirectoryParams = parse_params(self.name(), params)?;
        let created = self.browser.create_directory(Path::new(&params.path))?;
        Ok(serde_json::to_value(created)?)
    }
}
