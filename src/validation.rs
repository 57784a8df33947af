//! Identifier validation against the remote API
//!
//! Record and category ids pass a format check first, then a remote lookup
//! that confirms the id resolves to a real object. The lookup also resolves
//! the `me` alias to its numeric id.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::endpoint::Endpoint;

/// Accepted id spellings: a plain integer, or the `me` alias.
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+$|^me$").expect("Invalid regex"));

/// Error validating an id.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ValidationError {
    #[error("Invalid {0} id format: {1}")]
    Format(String, String),
    #[error("Lookup of {0} {1} failed: {2}")]
    Lookup(String, String, String),
    #[error("{0} {1} response carries no numeric id")]
    MissingId(String, String),
}

/// Check that `value` is a well-formed id.
pub fn is_id_like(value: &str) -> bool {
    ID_PATTERN.is_match(value)
}

/// Validate an id against a collection and resolve it to its numeric form.
///
/// The format check accepts digits or the `me` alias; the remote GET then
/// proves the object exists and yields the canonical numeric id (which is
/// how `me` resolves to a number).
///
/// # Arguments
/// * `endpoint` - API transport
/// * `collection` - Collection path, e.g. `items_types`
/// * `name` - Noun used in error messages, e.g. `category`
/// * `value` - Id to validate
pub fn validate_id<E: Endpoint>(
    endpoint: &E,
    collection: &str,
    name: &str,
    value: &str,
) -> Result<i64, ValidationError> {
    let value = value.trim();
    if !is_id_like(value) {
        return Err(ValidationError::Format(name.to_string(), value.to_string()));
    }
    let response = endpoint
        .get(&format!("{}/{}", collection, value), &[])
        .and_then(crate::endpoint::ApiResponse::error_for_status)
        .map_err(|e| ValidationError::Lookup(name.to_string(), value.to_string(), e.to_string()))?;
    let data = response
        .json()
        .map_err(|e| ValidationError::Lookup(name.to_string(), value.to_string(), e.to_string()))?;
    data.get("id")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| ValidationError::MissingId(name.to_string(), value.to_string()))
}
