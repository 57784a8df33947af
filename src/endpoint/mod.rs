//! API endpoint abstraction
//!
//! Everything that talks to the remote API goes through the [`Endpoint`]
//! trait, so the import/export pipelines can run against an in-memory fake
//! in tests. The trait deals in plain paths relative to a collection root
//! (`items`, `experiments/42/uploads`); the HTTP backend joins them onto
//! the configured host URL and injects authentication.

#[cfg(feature = "api-backend")]
pub mod http;

use std::path::PathBuf;

use serde_json::Value;

#[cfg(feature = "api-backend")]
pub use http::HttpEndpoint;

/// Error talking to the remote API.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum EndpointError {
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl EndpointError {
    /// True when the request failed by exceeding the read timeout, the one
    /// transport failure the paged fetcher retries.
    pub fn is_timeout(&self) -> bool {
        matches!(self, EndpointError::Timeout(_))
    }
}

/// A raw API response: status, body text and the `Location` header when the
/// server sent one (record creation reports the new URL that way).
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, EndpointError> {
        serde_json::from_str(&self.body).map_err(|e| EndpointError::InvalidBody(e.to_string()))
    }

    /// Turn a 4xx/5xx response into an [`EndpointError::Status`].
    pub fn error_for_status(self) -> Result<ApiResponse, EndpointError> {
        if self.status >= 400 {
            Err(EndpointError::Status {
                status: self.status,
                body: self.body,
            })
        } else {
            Ok(self)
        }
    }
}

/// A multipart upload: one or more files posted under a single form field.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub field: String,
    pub files: Vec<PathBuf>,
}

impl UploadBatch {
    /// Batch upload under the `files[]` field.
    pub fn multi(files: Vec<PathBuf>) -> Self {
        Self {
            field: "files[]".to_string(),
            files,
        }
    }

    /// Single file under an explicit field name (`files[]` or `file`,
    /// depending on what the server variant accepts).
    pub fn single(file: PathBuf, field: &str) -> Self {
        Self {
            field: field.to_string(),
            files: vec![file],
        }
    }
}

/// Transport used by the pipelines to reach the remote API.
///
/// Implementations return `Ok` for any response the server produced,
/// whatever its status code; `Err` is reserved for transport failures.
/// Callers decide per call site whether a non-2xx status is fatal.
pub trait Endpoint {
    /// GET `path`, with optional query parameters.
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<ApiResponse, EndpointError>;

    /// POST a JSON body to `path`.
    fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError>;

    /// PATCH `path` with a JSON body.
    fn patch(&self, path: &str, body: &Value) -> Result<ApiResponse, EndpointError>;

    /// POST a multipart file upload to `path`.
    fn upload(&self, path: &str, batch: &UploadBatch) -> Result<ApiResponse, EndpointError>;
}
