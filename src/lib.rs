//! ELN Sync SDK - Shared library for synchronizing tabular data with an
//! electronic lab notebook API
//!
//! Provides unified interfaces for:
//! - CSV ingestion (encoding detection, delimiter sniffing, header indexing)
//! - Record import with create-vs-patch reconciliation
//! - Extra-field metadata decoding and select-option coercion
//! - File attachment uploads
//! - Paged record export to .xlsx spreadsheets
//! - Remote identifier validation

pub mod columns;
pub mod config;
pub mod endpoint;
pub mod export;
pub mod import;
pub mod models;
pub mod normalize;
pub mod table;
pub mod validation;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export commonly used types
#[cfg(feature = "api-backend")]
pub use endpoint::HttpEndpoint;
pub use endpoint::{ApiResponse, Endpoint, EndpointError, UploadBatch};

pub use columns::{ColumnIndex, canonicalize};
pub use config::{ApiConfig, ConfigError, ImportConfig, SyncConfig};
pub use export::{
    ExperimentExporter, ExportError, FlatTable, PagedFetcher, ResourceExporter, flatten_records,
};
pub use import::{FileAttacher, ImportError, ImportReport, RecordImporter, RowFailure};
pub use table::{CsvRow, CsvTable, TableError};
pub use validation::{ValidationError, validate_id};

// Re-export models
pub use models::{ExtraField, FieldKind, FieldValue, Metadata, RecordKind};
