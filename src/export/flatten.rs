//! Record flattening for tabular export
//!
//! Turns a list of raw record objects into a header/rows table: base
//! columns are the union of record keys in first-seen order minus the
//! per-kind denylist and the raw `metadata` column; extra-field columns
//! named by field title are appended after them. The `body` column is
//! reduced from rich text to plain text.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::{Metadata, RecordKind};
use crate::normalize::strip_html;

/// A flattened export table. Header names are not necessarily unique; an
/// extra field may share its title with a base column.
#[derive(Debug, Clone, Default)]
pub struct FlatTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FlatTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at `(row, header)`, first matching column.
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column_index(header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Flatten raw records into an export table. Non-object records are
/// ignored.
pub fn flatten_records(records: &[Value], kind: RecordKind) -> FlatTable {
    let drop: HashSet<&str> = kind.export_drop_columns().iter().copied().collect();
    let objects: Vec<&serde_json::Map<String, Value>> =
        records.iter().filter_map(Value::as_object).collect();
    let extras_per_object: Vec<Vec<(String, Value)>> = objects
        .iter()
        .map(|object| Metadata::from_raw(object.get("metadata")).field_value_pairs())
        .collect();

    let mut base_cols: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if key == "metadata" || drop.contains(key.as_str()) {
                continue;
            }
            if !base_cols.iter().any(|col| col == key) {
                base_cols.push(key.clone());
            }
        }
    }

    let mut extra_cols: Vec<String> = Vec::new();
    for extras in &extras_per_object {
        for (title, _) in extras {
            if !extra_cols.iter().any(|col| col == title) {
                extra_cols.push(title.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(objects.len());
    for (object, extras) in objects.iter().zip(&extras_per_object) {
        let mut row = Vec::with_capacity(base_cols.len() + extra_cols.len());
        for col in &base_cols {
            let value = object.get(col);
            if col == "body" {
                row.push(strip_html(&cell_text(value)));
            } else {
                row.push(cell_text(value));
            }
        }
        for col in &extra_cols {
            let value = extras
                .iter()
                .find(|(title, _)| title == col)
                .map(|(_, value)| value);
            row.push(cell_text(value));
        }
        rows.push(row);
    }

    let mut headers = base_cols;
    headers.extend(extra_cols);
    FlatTable { headers, rows }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
