//! Import functionality
//!
//! Reconciles CSV rows against the remote API:
//! - Rows without an id create a new record; rows with one patch the
//!   existing record in place.
//! - Columns matching server-side extra-field definitions update those
//!   fields, with select-type values validated against the field's options.
//! - A configured path column drives file attachment for created records.

pub mod attachments;
pub mod record;

pub use attachments::FileAttacher;
pub use record::RecordImporter;

use crate::endpoint::EndpointError;
use crate::table::TableError;

/// Error during import
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("API error: {0}")]
    Endpoint(String),
    #[error("Could not parse record ID: {0:?}")]
    IdParse(String),
    #[error("Category ID must be numeric, got {0:?}")]
    InvalidCategory(String),
    #[error("Upload error: {0}")]
    Upload(String),
}

impl From<TableError> for ImportError {
    fn from(err: TableError) -> Self {
        ImportError::Csv(err.to_string())
    }
}

impl From<EndpointError> for ImportError {
    fn from(err: EndpointError) -> Self {
        ImportError::Endpoint(err.to_string())
    }
}

/// A row that could not be imported.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RowFailure {
    /// Zero-based data row index
    pub row: usize,
    /// Record id, when the row carried one
    pub id: Option<String>,
    /// Failure description
    pub reason: String,
}

/// Result of an import run.
///
/// Counts per outcome plus per-row failure details for reporting.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[must_use = "import results should be processed or errors checked"]
pub struct ImportReport {
    /// Records created from rows without an id
    pub created: usize,
    /// Existing records patched from rows with an id
    pub patched: usize,
    /// Rows that failed without stopping the run
    pub failed: usize,
    /// Details for every failed row
    pub failures: Vec<RowFailure>,
    /// Ids of all records touched, in row order
    pub record_ids: Vec<String>,
}

impl ImportReport {
    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} patched, {} failed",
            self.created, self.patched, self.failed
        )
    }
}
