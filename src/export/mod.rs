//! Export functionality
//!
//! Fetches records from the remote API page by page, flattens them into a
//! tabular form (server-internal columns dropped, extra fields expanded
//! into their own columns, rich-text bodies reduced to plain text) and
//! writes the result to an `.xlsx` spreadsheet.

pub mod flatten;
pub mod paged;
pub mod records;
pub mod spreadsheet;

pub use flatten::{flatten_records, FlatTable};
pub use paged::PagedFetcher;
pub use records::{ExperimentExporter, ResourceExporter};
pub use spreadsheet::{resolve_export_path, sanitize_filename, write_xlsx};

use crate::endpoint::EndpointError;

/// Error during export
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ExportError {
    #[error("API error: {0}")]
    Endpoint(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Spreadsheet error: {0}")]
    Xlsx(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<EndpointError> for ExportError {
    fn from(err: EndpointError) -> Self {
        ExportError::Endpoint(err.to_string())
    }
}
