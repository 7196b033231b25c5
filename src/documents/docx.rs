//! Word documents: body paragraphs and tables from `word/document.xml`.

use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::{ToolError, ToolResult};

const DEFAULT_STYLE: &str = "Normal";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub text: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocxTable {
    pub table_number: usize,
    pub rows: usize,
    pub columns: usize,
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocxContent {
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<DocxTable>,
    pub text_content: String,
    pub total_paragraphs: usize,
    pub total_tables: usize,
    pub total_characters: usize,
}

impl DocxContent {
    /// Paragraphs followed by tables rendered as pipe-separated rows.
    pub fn formatted_content(&self) -> String {
        let mut out = self.text_content.clone();
        for table in &self.tables {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&format!("=== Table {} ===", table.table_number));
            for row in &table.data {
                out.push('\n');
                out.push_str(&row.join(" | "));
            }
        }
        out
    }
}

pub fn read(path: &Path) -> ToolResult<DocxContent> {
    let file = std::fs::File::open(path)?;
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            let legacy = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("doc"));
            if legacy {
                return Err(ToolError::document(
                    "Word",
                    "legacy binary .doc files cannot be read; save the document as .docx and retry",
                ));
            }
            return Err(ToolError::document("Word", e));
        }
    };

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| ToolError::document("Word", "missing word/document.xml"))?
        .read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

/// Parse the main document part of a `.docx` package.
pub fn parse_document_xml(xml: &str) -> ToolResult<DocxContent> {
    let mut parser = BodyParser::default();
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => parser.open(e, false),
            Ok(Event::Empty(ref e)) => parser.open(e, true),
            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                parser.close(local.as_ref());
            }
            Ok(Event::Text(ref e)) => {
                if parser.in_text {
                    let text = e.unescape().map_err(|e| ToolError::document("Word", e))?;
                    parser.paragraph.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ToolError::document("Word", e)),
            _ => {}
        }
        buf.clear();
    }

    let text_content = parser
        .paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(DocxContent {
        total_paragraphs: parser.paragraphs.len(),
        total_tables: parser.tables.len(),
        total_characters: text_content.chars().count(),
        text_content,
        paragraphs: parser.paragraphs,
        tables: parser.tables,
    })
}

#[derive(Default)]
struct BodyParser {
    paragraphs: Vec<Paragraph>,
    tables: Vec<DocxTable>,

    in_text: bool,
    paragraph: String,
    style: Option<String>,

    table_depth: usize,
    table: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl BodyParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        match e.local_name().as_ref() {
            b"p" if !empty => {
                self.paragraph.clear();
                self.style = None;
            }
            b"pStyle" => self.style = attribute(e, b"val"),
            b"t" if !empty => self.in_text = true,
            b"tab" => self.paragraph.push('\t'),
            b"br" | b"cr" => self.paragraph.push('\n'),
            b"tbl" if !empty => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table.clear();
                }
            }
            b"tr" if !empty && self.table_depth == 1 => self.row.clear(),
            b"tc" if !empty && self.table_depth == 1 => self.cell.clear(),
            _ => {}
        }
    }

    fn close(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_text = false,
            b"p" => {
                let text = std::mem::take(&mut self.paragraph);
                let style = self.style.take();
                if self.table_depth > 0 {
                    // paragraphs inside tables belong to the cell
                    if !text.trim().is_empty() {
                        if !self.cell.is_empty() {
                            self.cell.push('\n');
                        }
                        self.cell.push_str(text.trim());
                    }
                } else if !text.trim().is_empty() {
                    self.paragraphs.push(Paragraph {
                        text: text.trim().to_string(),
                        style: style.unwrap_or_else(|| DEFAULT_STYLE.to_string()),
                    });
                }
            }
            b"tc" if self.table_depth == 1 => {
                let cell = std::mem::take(&mut self.cell);
                self.row.push(cell);
            }
            b"tr" if self.table_depth == 1 => {
                let row = std::mem::take(&mut self.row);
                self.table.push(row);
            }
            b"tbl" if self.table_depth > 0 => {
                if self.table_depth == 1 {
                    let data = std::mem::take(&mut self.table);
                    self.tables.push(DocxTable {
                        table_number: self.tables.len() + 1,
                        rows: data.len(),
                        columns: data.iter().map(Vec::len).max().unwrap_or(0),
                        data,
                    });
                }
                self.table_depth -= 1;
            }
            _ => {}
        }
    }
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly report</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Sales &amp; </w:t></w:r><w:r><w:t>costs</w:t></w:r></w:p>
    <w:p/>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Total</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>Widgets</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>12</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>
    <w:p><w:r><w:t>Done</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    /// Write a minimal `.docx` package containing `xml` as its document part.
    pub(crate) fn write_docx(path: &Path, xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_parse_paragraphs_and_styles() {
        let content = parse_document_xml(SAMPLE_XML).unwrap();
        assert_eq!(content.total_paragraphs, 3);
        assert_eq!(content.paragraphs[0].style, "Heading1");
        assert_eq!(content.paragraphs[1].text, "Sales & costs");
        assert_eq!(content.paragraphs[1].style, "Normal");
        assert_eq!(content.paragraphs[2].text, "Done");
    }

    #[test]
    fn test_parse_table() {
        let content = parse_document_xml(SAMPLE_XML).unwrap();
        assert_eq!(content.total_tables, 1);
        let table = &content.tables[0];
        assert_eq!(table.table_number, 1);
        assert_eq!(table.rows, 2);
        assert_eq!(table.columns, 2);
        assert_eq!(table.data[1], vec!["Widgets", "12"]);
        assert!(!content.text_content.contains("Widgets"));
        assert!(content.formatted_content().contains("Widgets | 12"));
    }

    #[test]
    fn test_read_docx_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        write_docx(&path, SAMPLE_XML);
        let content = read(&path).unwrap();
        assert_eq!(content.paragraphs[0].text, "Quarterly report");
        assert_eq!(content.total_tables, 1);
    }

    #[test]
    fn test_legacy_doc_has_helpful_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.doc");
        std::fs::write(&path, b"\xd0\xcf\x11\xe0 binary word").unwrap();
        let err = read(&path).unwrap_err();
        assert!(err.to_string().contains(".docx"));
    }
}
