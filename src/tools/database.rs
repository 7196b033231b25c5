//! SQL tools backed by the shared `DatabaseConnector`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_params, Tool};
use crate::database::{DatabaseConnector, Row};
use crate::error::{ToolError, ToolResult};

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct SqlParams {
    query: String,
    #[serde(default, alias = "parameters")]
    params: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct TableParams {
    table_name: String,
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CreateTableParams {
    table_name: String,
    data: Vec<Row>,
}

/// Run one SQL statement.
pub struct ExecuteSqlTool {
    db: Arc<DatabaseConnector>,
}

impl ExecuteSqlTool {
    pub fn new(db: Arc<DatabaseConnector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ExecuteSqlTool {
    fn name(&self) -> &str {
        "execute_sql"
    }

    fn description(&self) -> &str {
        "Execute a single SQL statement against the SQLite database. \
         SELECT-like statements return rows; other statements return the affected row count."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL statement; use ? placeholders for parameters"
                },
                "params": {
                    "type": "array",
                    "description": "Positional parameters bound to the placeholders",
                    "items": {}
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: SqlParams = parse_params(self.name(), params)?;
        if params.query.trim().is_empty() {
            return Err(ToolError::invalid("Query cannot be empty"));
        }
        let bound = params.params.unwrap_or_default();
        let output = self.db.execute_query(&params.query, &bound)?;
        Ok(serde_json::to_value(output)?)
    }
}

/// List user tables with their columns and row counts.
pub struct ListTablesTool {
    db: Arc<DatabaseConnector>,
}

impl ListTablesTool {
    pub fn new(db: Arc<DatabaseConnector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        "list_tables"
    }

    fn description(&self) -> &str {
        "List all user tables in the SQLite database with their columns and row counts."
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value) -> ToolResult<Value> {
        Ok(serde_json::to_value(self.db.list_tables()?)?)
    }
}

/// Schema, indexes, foreign keys and a few sample rows for one table.
pub struct DescribeTableTool {
    db: Arc<DatabaseConnector>,
}

impl DescribeTableTool {
    pub fn new(db: Arc<DatabaseConnector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for DescribeTableTool {
    fn name(&self) -> &str {
        "describe_table"
    }

    fn description(&self) -> &str {
        "Get schema information for a table: columns, indexes, foreign keys, \
         row count and sample rows."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to describe"
                }
            },
            "required": ["table_name"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: TableParams = parse_params(self.name(), params)?;
        Ok(serde_json::to_value(self.db.describe_table(&params.table_name)?)?)
    }
}

/// Recent statements from the in-memory query log.
pub struct QueryHistoryTool {
    db: Arc<DatabaseConnector>,
}

impl QueryHistoryTool {
    pub fn new(db: Arc<DatabaseConnector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for QueryHistoryTool {
    fn name(&self) -> &str {
        "get_query_history"
    }

    fn description(&self) -> &str {
        "Show recently executed SQL statements, newest first, with timing and outcome."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of entries to return",
                    "default": DEFAULT_HISTORY_LIMIT,
                    "minimum": 0
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: HistoryParams = parse_params(self.name(), params)?;
        let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        Ok(serde_json::to_value(self.db.query_history(limit))?)
    }
}

/// Create and fill a table from a list of row objects.
pub struct CreateTableFromDataTool {
    db: Arc<DatabaseConnector>,
}

impl CreateTableFromDataTool {
    pub fn new(db: Arc<DatabaseConnector>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CreateTableFromDataTool {
    fn name(&self) -> &str {
        "create_table_from_data"
    }

    fn description(&self) -> &str {
        "Create a table whose columns are inferred from the given rows, then insert every row."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "New table name (letters, digits and underscores)"
                },
                "data": {
                    "type": "array",
                    "description": "Rows to insert, as objects keyed by column name",
                    "items": { "type": "object" }
                }
            },
            "required": ["table_name", "data"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: CreateTableParams = parse_params(self.name(), params)?;
        let created = self.db.create_table_from_data(&params.table_name, &params.data)?;
        Ok(serde_json::to_value(created)?)
    }
}
