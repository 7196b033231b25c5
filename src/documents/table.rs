//! Shaping of header + rows data shared by the Excel and CSV readers.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::stats::{describe, NumericSummary};

/// Inferred type of a column, from its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
    Empty,
}

impl ColumnType {
    pub fn infer<'a>(values: impl Iterator<Item = &'a Value>) -> Self {
        let mut seen = None;
        for value in values {
            let kind = match value {
                Value::Null => continue,
                Value::Bool(_) => Self::Boolean,
                Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
                Value::Number(_) => Self::Float,
                _ => Self::String,
            };
            seen = Some(match (seen, kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(Self::Integer), Self::Float) | (Some(Self::Float), Self::Integer) => {
                    Self::Float
                }
                _ => return Self::String,
            });
        }
        seen.unwrap_or(Self::Empty)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Parse a text cell the way a dataframe loader would.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Make header names unique and non-empty. Repeats get `.1`, `.2`, ...
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, n);
            n += 1;
        }
        names.push(candidate);
    }
    names
}

/// Row limits applied when a table is returned to the caller.
#[derive(Debug, Clone, Copy)]
pub struct SampleLimits {
    /// Return every row when there are at most this many.
    pub inline_max: usize,
    /// Otherwise return this many leading rows.
    pub sample: usize,
    pub with_note: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableData {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub data_types: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_data: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub numeric_summary: Map<String, Value>,
}

/// A header row plus data rows of typed cells.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn summarize(self, limits: SampleLimits) -> TableData {
        let width = self.column_names.len();
        let total_rows = self.rows.len();

        let mut data_types = Map::new();
        let mut numeric_summary = Map::new();
        for (col, name) in self.column_names.iter().enumerate() {
            let cells = self.rows.iter().filter_map(|row| row.get(col));
            let kind = ColumnType::infer(cells);
            data_types.insert(name.clone(), serde_json::to_value(kind).unwrap_or(Value::Null));

            if kind.is_numeric() {
                let values: Vec<f64> = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col).and_then(Value::as_f64))
                    .collect();
                if let Some(summary) = describe(&values) {
                    numeric_summary.insert(name.clone(), summary_value(&summary));
                }
            }
        }

        let to_record = |row: Vec<Value>| {
            let mut record = Map::new();
            let mut cells = row.into_iter();
            for name in &self.column_names {
                record.insert(name.clone(), cells.next().unwrap_or(Value::Null));
            }
            record
        };

        let (data, sample_data, note) = if total_rows <= limits.inline_max {
            let records: Vec<_> = self.rows.into_iter().map(to_record).collect();
            (Some(records), None, None)
        } else {
            let records: Vec<_> = self
                .rows
                .into_iter()
                .take(limits.sample)
                .map(to_record)
                .collect();
            let note = limits.with_note.then(|| {
                format!(
                    "Showing first {} of {} rows",
                    limits.sample, total_rows
                )
            });
            (None, Some(records), note)
        };

        TableData {
            rows: total_rows,
            columns: width,
            column_names: self.column_names.clone(),
            data_types,
            data,
            sample_data,
            note,
            numeric_summary,
        }
    }
}

fn summary_value(summary: &NumericSummary) -> Value {
    serde_json::to_value(summary).unwrap_or(Value::Null)
}
