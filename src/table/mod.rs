//! CSV ingestion: decoding, delimiter sniffing and the in-memory table the
//! importer iterates.
//!
//! A loaded [`CsvTable`] is read-only: rows are borrowed views and values are
//! normalized into new locals downstream, never written back.

pub mod reader;

use std::path::Path;

use crate::columns::ColumnIndex;

/// Error while loading or parsing a CSV file.
#[derive(Debug, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Missing header row: {0}")]
    MissingHeader(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An in-memory CSV table with its header index built once at load time.
#[derive(Debug, Clone)]
pub struct CsvTable {
    headers: Vec<String>,
    columns: ColumnIndex,
    records: Vec<Vec<String>>,
    delimiter: u8,
}

impl CsvTable {
    /// Load a CSV file, auto-detecting encoding and delimiter.
    ///
    /// The raw bytes are decoded (UTF-8 first, windows-1252 fallback),
    /// normalized (BOM and non-breaking spaces removed, line endings
    /// unified) and sniffed for a delimiter before parsing. A file without
    /// a usable header row is an error; a missing `title` column is not.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| TableError::Io(format!("{}: {e}", path.display())))?;
        let text = reader::normalize_text(&reader::decode_bytes(&bytes));
        Self::parse(&text)
    }

    /// Parse already-decoded CSV text, auto-detecting the delimiter.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let text = reader::normalize_text(text);
        let delimiter = reader::detect_delimiter(&text);
        Self::parse_with_delimiter(&text, delimiter)
    }

    /// Parse already-decoded CSV text with an explicit delimiter.
    pub fn parse_with_delimiter(text: &str, delimiter: u8) -> Result<Self, TableError> {
        let (headers, records) = reader::parse_records(text, delimiter)?;
        let columns = ColumnIndex::from_headers(&headers);
        Ok(Self {
            headers,
            columns,
            records,
            delimiter,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<CsvRow<'_>> {
        self.records.get(index).map(|values| CsvRow {
            headers: &self.headers,
            values,
            index,
        })
    }

    /// Iterate rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.records.iter().enumerate().map(|(index, values)| CsvRow {
            headers: &self.headers,
            values,
            index,
        })
    }
}

/// A borrowed view of one data row, keyed by the table's original headers.
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    headers: &'a [String],
    values: &'a [String],
    index: usize,
}

impl<'a> CsvRow<'a> {
    /// Zero-based position of this row in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell value under an original header name; `None` if the table has no
    /// such column. An empty cell is `Some("")`.
    pub fn get(&self, header: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == header)
            .map(|i| self.values[i].as_str())
    }

    /// Iterate `(header, value)` pairs in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }
}
