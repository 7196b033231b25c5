//! Document reader: format detection plus one library call per format.

pub mod delimited;
pub mod docx;
pub mod excel;
pub mod pdf;
pub mod stats;
pub mod table;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{ToolError, ToolResult};

/// Documents larger than this are rejected unless configured otherwise.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Excel,
    Csv,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [Self::Pdf, Self::Docx, Self::Excel, Self::Csv];

    /// Map a file extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "doc" => Some(Self::Docx),
            "xlsx" | "xls" => Some(Self::Excel),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Map an explicit format name such as `pdf`, `word` or `xlsx`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "word" => Some(Self::Docx),
            "excel" => Some(Self::Excel),
            other => Self::from_extension(other),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Excel => "excel",
            Self::Csv => "csv",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &[".pdf"],
            Self::Docx => &[".docx", ".doc"],
            Self::Excel => &[".xlsx", ".xls"],
            Self::Csv => &[".csv"],
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every extension the reader accepts.
pub fn supported_formats() -> Vec<&'static str> {
    DocumentFormat::ALL
        .iter()
        .flat_map(|f| f.extensions().iter().copied())
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocumentContent {
    Pdf(pdf::PdfContent),
    Docx(docx::DocxContent),
    Excel(excel::ExcelContent),
    Csv(delimited::CsvContent),
}

impl DocumentContent {
    pub fn character_count(&self) -> usize {
        match self {
            Self::Pdf(c) => c.total_characters,
            Self::Docx(c) => c.total_characters,
            Self::Excel(_) | Self::Csv(_) => 0,
        }
    }

    /// Short human description, e.g. `3 pages` or `2 rows, 3 columns`.
    pub fn structure_info(&self) -> String {
        match self {
            Self::Pdf(c) => format!("{} pages", c.total_pages),
            Self::Docx(c) => format!(
                "{} paragraphs, {} tables",
                c.total_paragraphs, c.total_tables
            ),
            Self::Excel(c) => format!("{} sheets", c.summary.total_sheets),
            Self::Csv(c) => format!("{} rows, {} columns", c.table.rows, c.table.columns),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub metadata: DocumentMetadata,
    pub content: DocumentContent,
}

#[derive(Debug, Clone)]
pub struct DocumentReader {
    max_bytes: u64,
}

impl Default for DocumentReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

impl DocumentReader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Read `path` as `format`, which is `"auto"` or an explicit format name.
    pub fn read(&self, path: &Path, format: &str) -> ToolResult<DocumentResult> {
        let (format, metadata) = self.prepare(path, format)?;
        tracing::debug!(path = %path.display(), %format, "reading document");

        let content = match format {
            DocumentFormat::Pdf => DocumentContent::Pdf(pdf::read(path)?),
            DocumentFormat::Docx => DocumentContent::Docx(docx::read(path)?),
            DocumentFormat::Excel => DocumentContent::Excel(excel::read(path, None)?),
            DocumentFormat::Csv => DocumentContent::Csv(delimited::read(path)?),
        };
        Ok(DocumentResult { metadata, content })
    }

    /// Read a workbook, optionally restricted to one sheet.
    pub fn read_excel(&self, path: &Path, sheet_name: Option<&str>) -> ToolResult<DocumentResult> {
        let (_, metadata) = self.prepare(path, DocumentFormat::Excel.as_str())?;
        let content = DocumentContent::Excel(excel::read(path, sheet_name)?);
        Ok(DocumentResult { metadata, content })
    }

    /// Input checks shared by every format, done before any parsing.
    fn prepare(&self, path: &Path, format: &str) -> ToolResult<(DocumentFormat, DocumentMetadata)> {
        if !path.exists() {
            return Err(ToolError::NotFound(path.display().to_string()));
        }
        if !path.is_file() {
            return Err(ToolError::invalid(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        let format = resolve_format(path, format)?;

        let meta = std::fs::metadata(path)?;
        if meta.len() > self.max_bytes {
            return Err(ToolError::TooLarge {
                size: meta.len(),
                limit: self.max_bytes,
            });
        }

        let timestamp = |t: std::io::Result<std::time::SystemTime>| {
            t.ok()
                .map(|t| chrono::DateTime::<chrono::Local>::from(t).to_rfc3339())
        };
        let metadata = DocumentMetadata {
            file_path: path.display().to_string(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_size: meta.len(),
            format: format.as_str().to_string(),
            modified_time: timestamp(meta.modified()),
            created_time: timestamp(meta.created()),
        };
        Ok((format, metadata))
    }
}

fn resolve_format(path: &Path, format: &str) -> ToolResult<DocumentFormat> {
    let supported = || supported_formats().join(", ");
    if format.trim().is_empty() || format.eq_ignore_ascii_case("auto") {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        DocumentFormat::from_extension(&ext).ok_or_else(|| ToolError::UnsupportedFormat {
            format: if ext.is_empty() {
                "(no extension)".to_string()
            } else {
                format!(".{}", ext)
            },
            supported: supported(),
        })
    } else {
        DocumentFormat::from_name(format).ok_or_else(|| ToolError::UnsupportedFormat {
            format: format.to_string(),
            supported: supported(),
        })
    }
}
