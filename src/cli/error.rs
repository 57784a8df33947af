//! CLI-specific error types

use crate::config::ConfigError;
use crate::endpoint::EndpointError;
use crate::export::ExportError;
use crate::import::ImportError;
use crate::table::TableError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Endpoint error: {0}")]
    EndpointError(#[from] EndpointError),

    #[error("CSV error: {0}")]
    TableError(#[from] TableError),

    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),

    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),

    #[error("IO error: {0}")]
    IoError(String),
}
