//! Core data types shared between the tool router and the MCP server.
//!
//! Every tool call produces a JSON envelope:
//!
//! ```text
//! Ok(value)  -> { "success": true,  ...value fields }
//! Err(error) -> { "success": false, "error": "<message>" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolResult;

// --- Tool Definition ---

/// Describes a tool's interface to the host via JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's name (must match what the tool reports)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's input parameters
    pub input_schema: Value,
}

// --- Tool Outcome ---

/// The serialized result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub body: Value,
}

impl ToolOutcome {
    /// Build the envelope from a handler result.
    pub fn from_result(result: ToolResult<Value>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::failure(e.to_string()),
        }
    }

    pub fn success(value: Value) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(true));
        match value {
            Value::Object(fields) => {
                for (key, field) in fields {
                    if key != "success" {
                        body.insert(key, field);
                    }
                }
            }
            Value::Null => {}
            other => {
                body.insert("result".to_string(), other);
            }
        }
        Self {
            success: true,
            body: Value::Object(body),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "Unknown error".to_string();
        }
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(false));
        body.insert("error".to_string(), Value::String(message));
        Self {
            success: false,
            body: Value::Object(body),
        }
    }

    /// Pretty-printed JSON for the host.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.body.to_string())
    }
}
