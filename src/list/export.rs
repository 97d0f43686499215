// Spreadsheet export of the in-memory dataset

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{display_text, resolve_path, Record};

/// Maps a record value-path to the header it is exported under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportColumn {
    pub field: String,
    pub header: String,
}

impl ExportColumn {
    pub fn new(field: &str, header: &str) -> Self {
        Self {
            field: field.to_string(),
            header: header.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    /// Fields absent from `columns` are dropped; missing values become null
    pub fn from_records(records: &[Record], columns: &[ExportColumn]) -> Self {
        Self {
            headers: columns.iter().map(|column| column.header.clone()).collect(),
            rows: records
                .iter()
                .map(|record| {
                    columns
                        .iter()
                        .map(|column| resolve_path(record, &column.field).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows keyed by header
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| self.headers.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, self.headers.iter().map(String::as_str));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(display_text).collect();
            push_csv_line(&mut out, cells.iter().map(String::as_str));
        }
        out
    }
}

fn push_csv_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = cells
        .map(|cell| {
            if cell.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.to_string()
            }
        })
        .collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}
