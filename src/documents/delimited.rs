//! CSV files. A header row is required.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::table::{normalize_headers, parse_cell, SampleLimits, Table, TableData};
use crate::error::{ToolError, ToolResult};

const LIMITS: SampleLimits = SampleLimits {
    inline_max: 1000,
    sample: 100,
    with_note: true,
};

#[derive(Debug, Clone, Serialize)]
pub struct CsvContent {
    pub encoding: &'static str,
    #[serde(flatten)]
    pub table: TableData,
}

pub fn read(path: &Path) -> ToolResult<CsvContent> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

pub fn parse(bytes: &[u8]) -> ToolResult<CsvContent> {
    let (text, encoding) = decode(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| ToolError::document("CSV", e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(ToolError::document("CSV", "file has no header row"));
    }
    let width = header.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ToolError::document("CSV", e))?;
        // trailing delimiters are tolerated, real extra values are not
        if record.iter().skip(width).any(|field| !field.trim().is_empty()) {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(rows.len() as u64 + 2);
            return Err(ToolError::document(
                "CSV",
                format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                ),
            ));
        }
        let mut row: Vec<Value> = record.iter().take(width).map(parse_cell).collect();
        row.resize(width, Value::Null);
        rows.push(row);
    }

    let table = Table {
        column_names: normalize_headers(header),
        rows,
    };
    Ok(CsvContent {
        encoding,
        table: table.summarize(LIMITS),
    })
}

/// UTF-8 when valid, otherwise every byte is read as Latin-1.
fn decode(bytes: &[u8]) -> (String, &'static str) {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8"),
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), "latin-1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_columns() {
        let content = parse(b"name,age,score,active\nann,31,9.5,true\nbob,42,7,false\n").unwrap();
        let table = &content.table;
        assert_eq!(content.encoding, "utf-8");
        assert_eq!(table.rows, 2);
        assert_eq!(table.columns, 4);
        assert_eq!(table.data_types["name"], "string");
        assert_eq!(table.data_types["age"], "integer");
        assert_eq!(table.data_types["score"], "float");
        assert_eq!(table.data_types["active"], "boolean");
        assert_eq!(table.numeric_summary["age"]["mean"], 36.5);
        assert!(table.numeric_summary.get("active").is_none());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let content = parse(b"a,b,c\n1\n").unwrap();
        let data = content.table.data.unwrap();
        assert_eq!(data[0]["c"], Value::Null);
        assert_eq!(content.table.data_types["b"], "empty");
    }

    #[test]
    fn test_row_wider_than_header_is_rejected() {
        let err = parse(b"a,b\n1,2\n3,4,5\n").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "{}", message);
        assert!(message.contains("saw 3"), "{}", message);
    }

    #[test]
    fn test_trailing_delimiter_is_tolerated() {
        let content = parse(b"a,b\n1,2,\n").unwrap();
        assert_eq!(content.table.columns, 2);
        assert_eq!(content.table.data.unwrap()[0]["b"], 2);
    }

    #[test]
    fn test_latin1_fallback() {
        let content = parse(b"city\nM\xfcnchen\n").unwrap();
        assert_eq!(content.encoding, "latin-1");
        assert_eq!(content.table.data.unwrap()[0]["city"], "München");
    }

    #[test]
    fn test_large_file_is_sampled() {
        let mut text = String::from("n\n");
        for i in 0..1200 {
            text.push_str(&format!("{}\n", i));
        }
        let content = parse(text.as_bytes()).unwrap();
        assert_eq!(content.table.rows, 1200);
        assert_eq!(content.table.sample_data.as_ref().unwrap().len(), 100);
        assert!(content.table.note.is_some());
    }

    #[test]
    fn test_reading_twice_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x,y\n1,a\n2,b\n").unwrap();
        let first = serde_json::to_value(read(&path).unwrap()).unwrap();
        let second = serde_json::to_value(read(&path).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_file_has_no_header() {
        assert!(parse(b"").is_err());
    }
}
