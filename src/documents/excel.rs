//! Spreadsheets via calamine. The first row of every sheet is the header.

use std::path::Path;

use calamine::{Data, Reader};
use serde::Serialize;
use serde_json::{Number, Value};

use super::table::{normalize_headers, SampleLimits, Table, TableData};
use crate::error::{ToolError, ToolResult};

const LIMITS: SampleLimits = SampleLimits {
    inline_max: 1000,
    sample: 10,
    with_note: false,
};

#[derive(Debug, Clone, Serialize)]
pub struct SheetData {
    pub sheet_name: String,
    #[serde(flatten)]
    pub table: TableData,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetError {
    pub sheet: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcelSummary {
    pub total_sheets: usize,
    pub sheet_names: Vec<String>,
    pub total_rows: usize,
    pub total_columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExcelContent {
    pub sheets: Vec<SheetData>,
    pub summary: ExcelSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SheetError>,
}

/// Read every sheet, or only `sheet_name` when given.
pub fn read(path: &Path, sheet_name: Option<&str>) -> ToolResult<ExcelContent> {
    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| ToolError::document("Excel", e))?;
    let all_names = workbook.sheet_names();

    let selected: Vec<String> = match sheet_name {
        Some(wanted) => {
            if !all_names.iter().any(|n| n == wanted) {
                return Err(ToolError::invalid(format!(
                    "Sheet '{}' not found. Available sheets: {}",
                    wanted,
                    all_names.join(", ")
                )));
            }
            vec![wanted.to_string()]
        }
        None => all_names,
    };

    let mut sheets = Vec::with_capacity(selected.len());
    let mut errors = Vec::new();
    for name in &selected {
        match workbook.worksheet_range(name) {
            Ok(range) => {
                let rows: Vec<Vec<Value>> = range
                    .rows()
                    .map(|row| row.iter().map(cell_value).collect())
                    .collect();
                sheets.push(sheet_from_rows(name, rows));
            }
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "skipping unreadable sheet");
                errors.push(SheetError {
                    sheet: name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let summary = ExcelSummary {
        total_sheets: selected.len(),
        total_rows: sheets.iter().map(|s| s.table.rows).sum(),
        total_columns: sheets.iter().map(|s| s.table.columns).sum(),
        sheet_names: selected,
    };
    Ok(ExcelContent {
        sheets,
        summary,
        errors,
    })
}

/// Split the header row off and summarize the rest.
pub fn sheet_from_rows(name: &str, rows: Vec<Vec<Value>>) -> SheetData {
    let mut rows = rows.into_iter();
    let header: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|cell| match cell {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    let table = Table {
        column_names: normalize_headers(header),
        rows: rows.collect(),
    };
    SheetData {
        sheet_name: name.to_string(),
        table: table.summarize(LIMITS),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) if dt.is_duration() => match dt.as_duration() {
            Some(d) => Value::String(format_duration(d)),
            None => number(dt.as_f64()),
        },
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Value::String(d.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}

fn number(f: f64) -> Value {
    // xlsx stores every number as a double
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// `[h]:mm:ss`, the way Excel shows elapsed time.
fn format_duration(d: chrono::Duration) -> String {
    let total = d.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.abs();
    format!("{}{}:{:02}:{:02}", sign, total / 3600, total / 60 % 60, total % 60)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    /// Minimal single-sheet `.xlsx` package; string cells use inline strings.
    pub(crate) fn write_xlsx(path: &Path, sheet: &str, rows: &[Vec<Value>]) {
        let mut sheet_rows = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_rows.push_str(&format!("<row r=\"{}\">", r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                match cell {
                    Value::String(s) => sheet_rows.push_str(&format!(
                        "<c r=\"{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        reference, s
                    )),
                    Value::Number(n) => {
                        sheet_rows.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, n))
                    }
                    _ => {}
                }
            }
            sheet_rows.push_str("</row>");
        }

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                    sheet
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    sheet_rows
                ),
            ),
        ];

        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in parts {
            zip.start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn sample_rows() -> Vec<Vec<Value>> {
        vec![
            vec![json!("item"), json!("qty"), json!("price")],
            vec![json!("apple"), json!(3), json!(1.5)],
            vec![json!("pear"), json!(5), json!(2.5)],
        ]
    }

    #[test]
    fn test_sheet_from_rows() {
        let sheet = sheet_from_rows("Stock", sample_rows());
        assert_eq!(sheet.table.rows, 2);
        assert_eq!(sheet.table.columns, 3);
        assert_eq!(sheet.table.column_names, vec!["item", "qty", "price"]);
        assert_eq!(sheet.table.data_types["qty"], "integer");
        assert_eq!(sheet.table.data_types["price"], "float");
        assert_eq!(sheet.table.numeric_summary["qty"]["max"], 5.0);
        assert!(sheet.table.numeric_summary.get("item").is_none());
    }

    #[test]
    fn test_date_cells_become_iso_strings() {
        use calamine::{ExcelDateTime, ExcelDateTimeType};

        let date = Data::DateTime(ExcelDateTime::new(45292.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_value(&date), json!("2024-01-01T00:00:00"));

        let noon = Data::DateTime(ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_value(&noon), json!("2024-01-01T12:00:00"));

        let elapsed = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_value(&elapsed), json!("36:00:00"));

        let iso = Data::DateTimeIso("2024-03-05T08:30:00".to_string());
        assert_eq!(cell_value(&iso), json!("2024-03-05T08:30:00"));
    }

    #[test]
    fn test_whole_floats_become_integers() {
        assert_eq!(cell_value(&Data::Float(42.0)), json!(42));
        assert_eq!(cell_value(&Data::Float(2.25)), json!(2.25));
        assert_eq!(cell_value(&Data::Empty), Value::Null);
    }

    #[test]
    fn test_large_sheet_is_sampled_to_ten_rows() {
        let mut rows = vec![vec![json!("n")]];
        rows.extend((0..1500).map(|i| vec![json!(i)]));
        let sheet = sheet_from_rows("Big", rows);
        assert_eq!(sheet.table.rows, 1500);
        assert!(sheet.table.data.is_none());
        assert_eq!(sheet.table.sample_data.as_ref().unwrap().len(), 10);
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = sheet_from_rows("Empty", vec![]);
        assert_eq!(sheet.table.rows, 0);
        assert_eq!(sheet.table.columns, 0);
    }

    #[test]
    fn test_cell_value_whole_floats_become_integers() {
        assert_eq!(cell_value(&Data::Float(3.0)), json!(3));
        assert_eq!(cell_value(&Data::Float(3.25)), json!(3.25));
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Bool(true)), json!(true));
    }

    #[test]
    fn test_read_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.xlsx");
        write_xlsx(&path, "Stock", &sample_rows());

        let content = read(&path, None).unwrap();
        assert_eq!(content.summary.total_sheets, 1);
        assert_eq!(content.summary.sheet_names, vec!["Stock"]);
        assert_eq!(content.sheets[0].table.rows, 2);
        let data = content.sheets[0].table.data.as_ref().unwrap();
        assert_eq!(data[1]["item"], "pear");
        assert_eq!(data[1]["qty"], 5);
    }

    #[test]
    fn test_unknown_sheet_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.xlsx");
        write_xlsx(&path, "Stock", &sample_rows());

        let err = read(&path, Some("Missing")).unwrap_err();
        assert!(err.to_string().contains("Available sheets: Stock"));
    }
}
