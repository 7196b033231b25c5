//! SQLite connector.
//!
//! Executes caller-supplied SQL against a single database file and reports
//! reads and writes through the same result type. Every `execute_query`
//! call is recorded in a bounded in-memory [`QueryHistory`].

pub mod history;
pub mod value;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ToolError, ToolResult};
pub use history::{QueryHistory, QueryLogEntry, DEFAULT_HISTORY_CAPACITY};
use value::{json_to_sql, quote_ident, sql_to_json};

/// Rows used to infer column types in `create_table_from_data`.
const TYPE_INFERENCE_SAMPLE: usize = 10;

/// Rows included in `describe_table` samples.
const DESCRIBE_SAMPLE_ROWS: usize = 5;

pub type Row = Map<String, Value>;

/// Result of a single statement.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// The statement produced a result set (SELECT, PRAGMA, RETURNING, ...).
    Rows {
        query_type: String,
        rows_returned: usize,
        columns: Vec<String>,
        data: Vec<Row>,
        execution_time: f64,
    },
    /// The statement changed data or schema.
    Changes {
        query_type: String,
        rows_affected: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        last_insert_id: Option<i64>,
        execution_time: f64,
    },
}

impl QueryOutput {
    fn row_count(&self) -> usize {
        match self {
            Self::Rows { rows_returned, .. } => *rows_returned,
            Self::Changes { rows_affected, .. } => *rows_affected,
        }
    }

    fn with_execution_time(mut self, seconds: f64) -> Self {
        match &mut self {
            Self::Rows { execution_time, .. } | Self::Changes { execution_time, .. } => {
                *execution_time = seconds
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Value,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub column_count: usize,
    pub row_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableListing {
    pub total_tables: usize,
    pub system_tables: usize,
    pub tables: Vec<TableSummary>,
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub origin: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyInfo {
    pub id: i64,
    pub sequence: i64,
    pub table: String,
    pub from_column: String,
    pub to_column: Value,
    pub on_update: String,
    pub on_delete: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleData {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub column_count: usize,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub sample_data: SampleData,
    pub row_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub total_entries: usize,
    pub capacity: usize,
    pub history: Vec<QueryLogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTable {
    pub table_name: String,
    pub rows_inserted: usize,
    pub columns: Map<String, Value>,
}

/// Owns the database handle and the query history.
pub struct DatabaseConnector {
    path: PathBuf,
    conn: Mutex<Connection>,
    history: Mutex<QueryHistory>,
}

impl DatabaseConnector {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: &Path, history_capacity: usize) -> ToolResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self::with_connection(path.to_path_buf(), conn, history_capacity))
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(history_capacity: usize) -> ToolResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(
            PathBuf::from(":memory:"),
            conn,
            history_capacity,
        ))
    }

    fn with_connection(path: PathBuf, conn: Connection, history_capacity: usize) -> Self {
        Self {
            path,
            conn: Mutex::new(conn),
            history: Mutex::new(QueryHistory::new(history_capacity)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn history(&self) -> MutexGuard<'_, QueryHistory> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Execute one statement with positional parameters.
    ///
    /// Appends exactly one history entry whether the statement succeeds or not.
    pub fn execute_query(&self, sql: &str, params: &[Value]) -> ToolResult<QueryOutput> {
        let started = Instant::now();
        let result = self.run_statement(sql, params);
        let elapsed = started.elapsed().as_secs_f64();

        let entry = QueryLogEntry {
            query: sql.to_string(),
            parameters: params.to_vec(),
            executed_at: chrono::Local::now().to_rfc3339(),
            execution_time: elapsed,
            rows_affected: result.as_ref().map(QueryOutput::row_count).unwrap_or(0),
            success: result.is_ok(),
            error_message: result.as_ref().err().map(|e| e.to_string()),
        };
        self.history().push(entry);

        match &result {
            Ok(output) => debug!(
                rows = output.row_count(),
                elapsed_ms = elapsed * 1000.0,
                "query executed"
            ),
            Err(e) => warn!(error = %e, "query failed"),
        }

        result.map(|output| output.with_execution_time(elapsed))
    }

    fn run_statement(&self, sql: &str, params: &[Value]) -> ToolResult<QueryOutput> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(ToolError::invalid("Query cannot be empty"));
        }
        let query_type = statement_keyword(sql);
        let bound: Vec<_> = params.iter().map(json_to_sql).collect();

        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;

        if stmt.column_count() > 0 {
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(bound.iter()))?;
            let mut data = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (i, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), sql_to_json(row.get_ref(i)?));
                }
                data.push(record);
            }
            Ok(QueryOutput::Rows {
                query_type,
                rows_returned: data.len(),
                columns,
                data,
                execution_time: 0.0,
            })
        } else {
            let rows_affected = stmt.execute(params_from_iter(bound.iter()))?;
            let last_insert_id = if query_type == "INSERT" || query_type == "REPLACE" {
                Some(conn.last_insert_rowid()).filter(|id| *id != 0)
            } else {
                None
            };
            Ok(QueryOutput::Changes {
                query_type,
                rows_affected,
                last_insert_id,
                execution_time: 0.0,
            })
        }
    }

    /// All user tables with their columns and row counts.
    pub fn list_tables(&self) -> ToolResult<TableListing> {
        let conn = self.conn();
        let names: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
            [],
            |row| row.get(0),
        )?;

        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            let columns = table_columns(&conn, name)?;
            tables.push(TableSummary {
                name: name.clone(),
                column_count: columns.len(),
                columns,
                row_count: row_count(&conn, name)?,
            });
        }

        Ok(TableListing {
            total_tables: tables.len(),
            system_tables: (total as usize).saturating_sub(tables.len()),
            tables,
            database_path: self.path.display().to_string(),
        })
    }

    /// Columns, indexes, foreign keys and a few sample rows of one table.
    pub fn describe_table(&self, table_name: &str) -> ToolResult<TableDescription> {
        let conn = self.conn();
        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table_name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(ToolError::invalid(format!(
                "Table '{}' does not exist",
                table_name
            )));
        }

        let columns = table_columns(&conn, table_name)?;

        let indexes = {
            let mut stmt =
                conn.prepare("SELECT name, \"unique\", origin FROM pragma_index_list(?1)")?;
            let rows = stmt.query_map([table_name], |row| {
                Ok(IndexInfo {
                    name: row.get(0)?,
                    unique: row.get::<_, i64>(1)? != 0,
                    origin: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let foreign_keys = {
            let mut stmt = conn.prepare(
                "SELECT id, seq, \"table\", \"from\", \"to\", on_update, on_delete \
                 FROM pragma_foreign_key_list(?1)",
            )?;
            let rows = stmt.query_map([table_name], |row| {
                Ok(ForeignKeyInfo {
                    id: row.get(0)?,
                    sequence: row.get(1)?,
                    table: row.get(2)?,
                    from_column: row.get(3)?,
                    to_column: sql_to_json(row.get_ref(4)?),
                    on_update: row.get(5)?,
                    on_delete: row.get(6)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let sample_sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_ident(table_name),
            DESCRIBE_SAMPLE_ROWS
        );
        let sample_data = {
            let mut stmt = conn.prepare(&sample_sql)?;
            let sample_columns: Vec<String> =
                stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query([])?;
            let mut sample_rows = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (i, name) in sample_columns.iter().enumerate() {
                    record.insert(name.clone(), sql_to_json(row.get_ref(i)?));
                }
                sample_rows.push(record);
            }
            SampleData {
                columns: sample_columns,
                rows: sample_rows,
            }
        };

        Ok(TableDescription {
            name: table_name.to_string(),
            column_count: columns.len(),
            columns,
            indexes,
            foreign_keys,
            sample_data,
            row_count: row_count(&conn, table_name)?,
        })
    }

    /// Newest-first view of the in-memory query log.
    pub fn query_history(&self, limit: usize) -> HistoryView {
        let history = self.history();
        HistoryView {
            total_entries: history.len(),
            capacity: history.capacity(),
            history: history.recent(limit),
        }
    }

    /// Create a table whose columns are inferred from `rows`, then insert them.
    pub fn create_table_from_data(&self, table_name: &str, rows: &[Row]) -> ToolResult<CreatedTable> {
        if rows.is_empty() {
            return Err(ToolError::invalid("Data cannot be empty"));
        }
        if table_name.is_empty()
            || !table_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ToolError::invalid(
                "Table name must be alphanumeric (underscores allowed)",
            ));
        }

        let columns = infer_columns(&rows[..rows.len().min(TYPE_INFERENCE_SAMPLE)]);
        if columns.is_empty() {
            return Err(ToolError::invalid("Data rows have no columns"));
        }

        let definitions: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.sql_type))
            .collect();
        let create_sql = format!(
            "CREATE TABLE {} ({})",
            quote_ident(table_name),
            definitions.join(", ")
        );
        let column_list: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table_name),
            column_list.join(", "),
            placeholders.join(", ")
        );

        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(&create_sql, [])?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            for row in rows {
                let values: Vec<_> = columns
                    .iter()
                    .map(|c| json_to_sql(row.get(&c.source_key).unwrap_or(&Value::Null)))
                    .collect();
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;

        let mut column_types = Map::new();
        for c in &columns {
            column_types.insert(c.name.clone(), Value::String(c.sql_type.to_string()));
        }
        Ok(CreatedTable {
            table_name: table_name.to_string(),
            rows_inserted: rows.len(),
            columns: column_types,
        })
    }
}

/// Upper-cased first keyword of a statement, e.g. `SELECT` or `CREATE`.
fn statement_keyword(sql: &str) -> String {
    sql.split(|c: char| c.is_whitespace() || c == '(' || c == ';')
        .find(|word| !word.is_empty())
        .unwrap_or("")
        .to_uppercase()
}

fn table_columns(conn: &Connection, table_name: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let rows = stmt.query_map([table_name], |row| {
        Ok(ColumnInfo {
            name: row.get(0)?,
            data_type: row.get(1)?,
            not_null: row.get::<_, i64>(2)? != 0,
            default_value: sql_to_json(row.get_ref(3)?),
            primary_key: row.get::<_, i64>(4)? != 0,
        })
    })?;
    rows.collect()
}

fn row_count(conn: &Connection, table_name: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table_name)),
        [],
        |row| row.get(0),
    )
}

#[derive(Debug, Clone, PartialEq)]
struct InferredColumn {
    source_key: String,
    name: String,
    sql_type: &'static str,
}

/// Column names in first-seen order with a SQLite type for each.
fn infer_columns(sample: &[Row]) -> Vec<InferredColumn> {
    let mut keys: Vec<&String> = Vec::new();
    for row in sample {
        for key in row.keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    let mut columns: Vec<InferredColumn> = Vec::with_capacity(keys.len());
    for key in keys {
        let values: Vec<&Value> = sample
            .iter()
            .filter_map(|row| row.get(key))
            .filter(|v| !v.is_null())
            .collect();

        let sql_type = if values.is_empty() {
            "TEXT"
        } else if values.iter().all(|v| v.is_boolean()) {
            "BOOLEAN"
        } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
            "INTEGER"
        } else if values.iter().all(|v| v.is_number()) {
            "REAL"
        } else {
            "TEXT"
        };

        let mut name = sanitize_column_name(key);
        let base = name.clone();
        let mut suffix = 2;
        while columns.iter().any(|c| c.name == name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        columns.push(InferredColumn {
            source_key: key.clone(),
            name,
            sql_type,
        });
    }
    columns
}

fn sanitize_column_name(raw: &str) -> String {
    let clean: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match clean.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => clean,
        _ => format!("col_{}", clean),
    }
}
