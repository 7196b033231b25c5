//! Document tools: generic reader plus per-format shortcuts.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_params, Tool};
use crate::documents::{DocumentContent, DocumentReader, DocumentResult};
use crate::error::ToolResult;

#[derive(Debug, Deserialize)]
struct DocumentParams {
    file_path: String,
    #[serde(default = "auto_format")]
    format: String,
}

fn auto_format() -> String {
    "auto".to_string()
}

#[derive(Debug, Deserialize)]
struct PathParams {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct ExcelParams {
    file_path: String,
    #[serde(default)]
    sheet_name: Option<String>,
}

fn file_path_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "file_path": {
                "type": "string",
                "description": description
            }
        },
        "required": ["file_path"]
    })
}

/// Serialize a document result and attach one extra top-level field.
fn with_field(result: &DocumentResult, key: &str, field: Value) -> ToolResult<Value> {
    let mut value = serde_json::to_value(result)?;
    if let Value::Object(map) = &mut value {
        map.insert(key.to_string(), field);
    }
    Ok(value)
}

/// Read a document in any supported format.
pub struct ReadDocumentTool {
    reader: Arc<DocumentReader>,
}

impl ReadDocumentTool {
    pub fn new(reader: Arc<DocumentReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadDocumentTool {
    fn name(&self) -> &str {
        "read_document"
    }

    fn description(&self) -> &str {
        "Read and extract content from PDF, Word, Excel and CSV files. \
         Returns file metadata, the extracted content and a short structure summary."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the document (relative or absolute)"
                },
                "format": {
                    "type": "string",
                    "description": "'pdf', 'docx', 'doc', 'xlsx', 'xls', 'csv', or 'auto' to detect from the extension",
                    "default": "auto"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: DocumentParams = parse_params(self.name(), params)?;
        let result = self.reader.read(Path::new(&params.file_path), &params.format)?;

        let summary = json!({
            "file_type": result.metadata.format,
            "character_count": result.content.character_count(),
            "structure_info": result.content.structure_info(),
        });
        with_field(&result, "summary", summary)
    }
}

/// Read a PDF page by page.
pub struct ReadPdfTool {
    reader: Arc<DocumentReader>,
}

impl ReadPdfTool {
    pub fn new(reader: Arc<DocumentReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadPdfTool {
    fn name(&self) -> &str {
        "read_pdf"
    }

    fn description(&self) -> &str {
        "Extract text from a PDF file, page by page."
    }

    fn parameters_schema(&self) -> Value {
        file_path_schema("Path to the PDF file")
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: PathParams = parse_params(self.name(), params)?;
        let result = self.reader.read(Path::new(&params.file_path), "pdf")?;
        let formatted = match &result.content {
            DocumentContent::Pdf(pdf) => pdf.formatted_text(),
            _ => String::new(),
        };
        with_field(&result, "formatted_text", Value::String(formatted))
    }
}

/// Read a Word document's paragraphs and tables.
pub struct ReadWordDocumentTool {
    reader: Arc<DocumentReader>,
}

impl ReadWordDocumentTool {
    pub fn new(reader: Arc<DocumentReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadWordDocumentTool {
    fn name(&self) -> &str {
        "read_word_document"
    }

    fn description(&self) -> &str {
        "Read a Word document (.docx) and extract its paragraphs and tables."
    }

    fn parameters_schema(&self) -> Value {
        file_path_schema("Path to the Word document")
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: PathParams = parse_params(self.name(), params)?;
        let result = self.reader.read(Path::new(&params.file_path), "docx")?;
        let formatted = match &result.content {
            DocumentContent::Docx(docx) => docx.formatted_content(),
            _ => String::new(),
        };
        with_field(&result, "formatted_content", Value::String(formatted))
    }
}

/// Read worksheets from an Excel workbook.
pub struct ReadExcelFileTool {
    reader: Arc<DocumentReader>,
}

impl ReadExcelFileTool {
    pub fn new(reader: Arc<DocumentReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadExcelFileTool {
    fn name(&self) -> &str {
        "read_excel_file"
    }

    fn description(&self) -> &str {
        "Read data from an Excel workbook (.xlsx, .xls). Reads every sheet \
         unless sheet_name is given."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the Excel file"
                },
                "sheet_name": {
                    "type": "string",
                    "description": "Only read this sheet"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, params: Value) -> ToolResult<Value> {
        let params: ExcelParams = parse_params(self.name(), params)?;
        let sheet = params
            .sheet_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let result = self.reader.read_excel(Path::new(&params.file_path), sheet)?;
        Ok(serde_json::to_value(&result)?)
    }
}
