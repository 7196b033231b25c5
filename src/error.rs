//! Error types shared by every tool handler.
//!
//! Components return `ToolResult<T>`; the tool router turns the error side
//! into a `{"success": false, "error": ...}` envelope so nothing escapes the
//! tool boundary.

use thiserror::Error;

pub type ToolResult<T> = Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ToolError {
    // --- Input errors (detected before delegating) ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Path does not exist: {0}")]
    NotFound(String),

    #[error("Unsupported format: {format}. Supported formats: {supported}")]
    UnsupportedFormat { format: String, supported: String },

    #[error("File too large: {size} bytes (max {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    // --- Delegate errors ---
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unable to read {format} document: {message}")]
    Document { format: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GitHub API error ({status}): {message}")]
    GitHub { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // --- Router errors ---
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn document(format: &'static str, message: impl ToString) -> Self {
        Self::Document {
            format,
            message: message.to_string(),
        }
    }

    /// True for errors raised before any library call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::NotFound(_)
                | Self::UnsupportedFormat { .. }
                | Self::TooLarge { .. }
                | Self::InvalidArguments { .. }
        )
    }
}
