use std::path::Path;

use serde::Serialize;

use crate::error::{ToolError, ToolResult};

#[derive(Debug, Clone, Serialize)]
pub struct PdfPage {
    pub page_number: usize,
    pub text: String,
    pub character_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfContent {
    pub pages: Vec<PdfPage>,
    pub total_pages: usize,
    pub text_content: String,
    pub total_characters: usize,
}

pub fn read(path: &Path) -> ToolResult<PdfContent> {
    // pdf-extract panics on some malformed files
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
        .map_err(|_| ToolError::document("PDF", "parser aborted on malformed input"))?
        .map_err(|e| ToolError::document("PDF", e))?;
    Ok(from_pages(pages))
}

/// Build the page list from per-page extracted text, in document order.
pub fn from_pages<I, S>(pages: I) -> PdfContent
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pages: Vec<PdfPage> = pages
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let text = raw.as_ref().trim().to_string();
            PdfPage {
                page_number: i + 1,
                character_count: text.chars().count(),
                text,
            }
        })
        .collect();

    let text_content = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    PdfContent {
        total_pages: pages.len(),
        total_characters: text_content.chars().count(),
        text_content,
        pages,
    }
}

impl PdfContent {
    /// Page text with `=== Page N ===` headers.
    pub fn formatted_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| format!("=== Page {} ===\n{}", p.page_number, p.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
