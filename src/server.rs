//! MCP bridge: exposes the `ToolRouter` through rmcp's `ServerHandler`.
//!
//! rmcp owns the transport, the initialize handshake and JSON-RPC framing.
//! This module only translates tool listings and tool calls.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;

use crate::tools::ToolRouter;
use crate::types::ToolDefinition;

pub const SERVER_NAME: &str = "universal-mcp";

pub struct McpServer {
    router: Arc<ToolRouter>,
    github_enabled: bool,
}

impl McpServer {
    pub fn new(router: ToolRouter, github_enabled: bool) -> Self {
        Self {
            router: Arc::new(router),
            github_enabled,
        }
    }

    /// Router definitions in rmcp's tool shape.
    pub fn tools(&self) -> Vec<rmcp::model::Tool> {
        self.router.definitions().into_iter().map(to_rmcp_tool).collect()
    }

    /// Run one tool call. Unknown names are protocol errors; tool failures
    /// are reported in-band with `is_error` set.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        if !self.router.has_tool(name) {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", name),
                None,
            ));
        }

        let params = arguments.map(Value::Object).unwrap_or(Value::Null);
        let outcome = self.router.execute(name, params).await;
        let content = vec![Content::text(outcome.to_json_string())];
        Ok(if outcome.success {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        })
    }

    fn instructions(&self) -> String {
        let mut text = String::from(
            "Utility tools for reading documents (PDF, Word, Excel, CSV), querying a \
             SQLite database and browsing the local filesystem.",
        );
        if self.github_enabled {
            text.push_str(" GitHub repository and issue tools are also available.");
        }
        text
    }
}

fn to_rmcp_tool(definition: ToolDefinition) -> rmcp::model::Tool {
    let schema = match definition.input_schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    rmcp::model::Tool::new(definition.name, definition.description, Arc::new(schema))
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(self.instructions()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(&request.name, request.arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::tools::create_default_router;
    use serde_json::json;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    fn server(dir: &std::path::Path) -> McpServer {
        let state = AppState::for_tests(dir);
        McpServer::new(create_default_router(&state), false)
    }

    fn text_of(result: &CallToolResult) -> Value {
        let text = result.content[0].as_text().unwrap().text.clone();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_tool_listing() {
        let dir = tempfile::tempdir().unwrap();
        let tools = server(dir.path()).tools();
        assert_eq!(tools.len(), 13);
        let execute = tools.iter().find(|t| t.name == "execute_sql").unwrap();
        assert_eq!(execute.input_schema["type"], "object");
    }

    #[test]
    fn test_info_advertises_tools() {
        let dir = tempfile::tempdir().unwrap();
        let info = server(dir.path()).get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(!info.instructions.unwrap().contains("GitHub"));
    }

    #[test]
    fn test_missing_document_is_in_band_error() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let rt = rt();
        let mut args = JsonObject::new();
        args.insert("file_path".into(), json!("/no/such/report.pdf"));

        let result = rt.block_on(server.call("read_document", Some(args))).unwrap();
        assert_eq!(result.is_error, Some(true));
        let body = text_of(&result);
        assert_eq!(body["success"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_sql_round_trip_through_server() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let rt = rt();
        rt.block_on(async {
            for sql in [
                "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)",
                "INSERT INTO t (name) VALUES ('a')",
            ] {
                let mut args = JsonObject::new();
                args.insert("query".into(), json!(sql));
                let result = server.call("execute_sql", Some(args)).await.unwrap();
                assert_eq!(result.is_error, Some(false));
            }

            let mut args = JsonObject::new();
            args.insert("query".into(), json!("SELECT * FROM t"));
            let result = server.call("execute_sql", Some(args)).await.unwrap();
            let body = text_of(&result);
            assert_eq!(body["success"], true);
            assert_eq!(body["data"], json!([{ "id": 1, "name": "a" }]));
        });
    }

    #[test]
    fn test_unknown_tool_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());
        let rt = rt();
        let err = rt.block_on(server.call("no_such_tool", None)).unwrap_err();
        assert!(err.message.contains("no_such_tool"));
    }
}
