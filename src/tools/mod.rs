//! Tool System module.
//!
//! This module defines the `Tool` trait and `ToolRouter` that together
//! form the tool execution framework.
//!
//! Key concepts:
//! - **Tool trait**: every tool implements this trait, providing its name,
//!   description, JSON Schema for parameters, and an execute method
//! - **ToolRouter**: a registry that holds all available tools and dispatches
//!   tool calls by name to the correct implementation
//! - **ToolOutcome**: whatever a tool returns, the router hands the host a
//!   `{"success": ...}` envelope, never a raw error

pub mod database;
pub mod documents;
pub mod files;
pub mod github;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{ToolError, ToolResult};
use crate::state::AppState;
use crate::types::{ToolDefinition, ToolOutcome};

/// Trait that all tools must implement.
///
/// Tools receive JSON arguments and return a JSON value that becomes the
/// body of the success envelope.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "read_document").
    fn name(&self) -> &str;

    /// A human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, params: Value) -> ToolResult<Value>;

    /// Convert this tool into a ToolDefinition for the host.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Deserialize tool arguments, treating missing arguments as `{}`.
pub fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> ToolResult<T> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Routes tool calls to the correct tool implementation.
pub struct ToolRouter {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRouter {
    /// Create a new empty ToolRouter.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool with the router.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all tool definitions, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Run a tool by name and return its raw result.
    pub async fn dispatch(&self, name: &str, params: Value) -> ToolResult<Value> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        debug!(tool = name, "executing tool");
        tool.execute(params).await
    }

    /// Run a tool by name and wrap the result in the success/error envelope.
    pub async fn execute(&self, name: &str, params: Value) -> ToolOutcome {
        let result = self.dispatch(name, params).await;
        if let Err(e) = &result {
            error!(tool = name, error = %e, "tool failed");
        }
        ToolOutcome::from_result(result)
    }

    /// Check if a tool with the given name is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the router has no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a ToolRouter with every tool the state can back.
///
/// GitHub tools are only registered when a token was configured.
pub fn create_default_router(state: &AppState) -> ToolRouter {
    let mut router = ToolRouter::new();

    let reader = state.documents.clone();
    router.register(Box::new(documents::ReadDocumentTool::new(reader.clone())));
    router.register(Box::new(documents::ReadPdfTool::new(reader.clone())));
    router.register(Box::new(documents::ReadWordDocumentTool::new(reader.clone())));
    router.register(Box::new(documents::ReadExcelFileTool::new(reader)));

    let db = state.database.clone();
    router.register(Box::new(database::ExecuteSqlTool::new(db.clone())));
    router.register(Box::new(database::ListTablesTool::new(db.clone())));
    router.register(Box::new(database::DescribeTableTool::new(db.clone())));
    router.register(Box::new(database::QueryHistoryTool::new(db.clone())));
    router.register(Box::new(database::CreateTableFromDataTool::new(db)));

    let browser = state.files.clone();
    router.register(Box::new(files::BrowseDirectoryTool::new(browser.clone())));
    router.register(Box::new(files::FileInfoTool::new(browser.clone())));
    router.register(Box::new(files::SearchFilesTool::new(browser.clone())));
    router.register(Box::new(files::CreateDirectoryTool::new(browser)));

    if let Some(manager) = &state.github {
        router.register(Box::new(github::ListRepositoriesTool::new(manager.clone())));
        router.register(Box::new(github::RepositoryInfoTool::new(manager.clone())));
        router.register(Box::new(github::ListIssuesTool::new(manager.clone())));
        router.register(Box::new(github::CreateIssueTool::new(manager.clone())));
        router.register(Box::new(github::GetIssueTool::new(manager.clone())));
        router.register(Box::new(github::UserInfoTool::new(manager.clone())));
    }

    router
}
