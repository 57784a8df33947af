//! Record exporters
//!
//! One exporter per record kind. Experiments are fetched in full;
//! resources are filtered to a category, which is validated against the
//! API before any page is requested.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::endpoint::{ApiResponse, Endpoint};
use crate::export::{
    flatten_records, resolve_export_path, write_xlsx, ExportError, FlatTable, PagedFetcher,
};
use crate::models::RecordKind;
use crate::validation::validate_id;

/// Window size for experiment fetches.
pub const EXPERIMENT_PAGE_SIZE: usize = 30;

/// Window size for resource fetches; resource payloads are small enough
/// for much larger windows.
pub const RESOURCE_PAGE_SIZE: usize = 1000;

/// Collection responses are either a bare array or wrapped in `data`.
fn collection_items(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items.clone(),
        Value::Object(object) => match object.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

pub struct ExperimentExporter<'a, E: Endpoint> {
    endpoint: &'a E,
    fetcher: PagedFetcher,
}

impl<'a, E: Endpoint> ExperimentExporter<'a, E> {
    pub fn new(endpoint: &'a E) -> Self {
        Self {
            endpoint,
            fetcher: PagedFetcher::new(EXPERIMENT_PAGE_SIZE),
        }
    }

    /// Override the paging policy, mainly for tests.
    pub fn with_fetcher(mut self, fetcher: PagedFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Fetch all experiments from `start_offset` onwards.
    pub fn fetch_records(&self, start_offset: usize) -> Result<Vec<Value>, ExportError> {
        info!(
            "Fetching experiments with page_size={} start_offset={}",
            self.fetcher.page_size(),
            start_offset
        );
        let records = self.fetcher.fetch_all(start_offset, |limit, offset| {
            let response = self
                .endpoint
                .get(
                    RecordKind::Experiment.collection(),
                    &[("limit", limit.to_string()), ("offset", offset.to_string())],
                )
                .and_then(ApiResponse::error_for_status)?;
            Ok(collection_items(&response.json()?))
        })?;
        info!("Fetched {} experiments", records.len());
        Ok(records)
    }

    /// Fetch and flatten into an export table.
    pub fn process(&self) -> Result<FlatTable, ExportError> {
        let records = self.fetch_records(0)?;
        if records.is_empty() {
            info!("No experiments to export");
        }
        Ok(flatten_records(&records, RecordKind::Experiment))
    }

    /// Export to a spreadsheet in `dir`; `requested` overrides the
    /// timestamped default filename. Returns the written path.
    pub fn export_xlsx(&self, dir: &Path, requested: Option<&str>) -> Result<PathBuf, ExportError> {
        let table = self.process()?;
        let path = resolve_export_path(dir, requested, "experiments_export");
        write_xlsx(&table, &path)?;
        info!("Exported {} experiments to {}", table.len(), path.display());
        Ok(path)
    }
}

pub struct ResourceExporter<'a, E: Endpoint> {
    endpoint: &'a E,
    category_id: String,
    fetcher: PagedFetcher,
}

impl<'a, E: Endpoint> ResourceExporter<'a, E> {
    pub fn new(endpoint: &'a E, category_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            category_id: category_id.into(),
            fetcher: PagedFetcher::new(RESOURCE_PAGE_SIZE),
        }
    }

    /// Override the paging policy, mainly for tests.
    pub fn with_fetcher(mut self, fetcher: PagedFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Fetch all resources in the category from `start_offset` onwards.
    ///
    /// The category id is validated first; a category that does not
    /// resolve on the remote side fails the export before any page is
    /// requested.
    pub fn fetch_records(&self, start_offset: usize) -> Result<Vec<Value>, ExportError> {
        let category = validate_id(self.endpoint, "items_types", "category", &self.category_id)
            .map_err(|e| ExportError::Validation(e.to_string()))?;
        info!("Fetching resources for category {}", category);
        let records = self.fetcher.fetch_all(start_offset, |limit, offset| {
            let response = self
                .endpoint
                .get(
                    RecordKind::Resource.collection(),
                    &[
                        ("cat", category.to_string()),
                        ("limit", limit.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .and_then(ApiResponse::error_for_status)?;
            Ok(collection_items(&response.json()?))
        })?;
        info!("Fetched {} resources", records.len());
        Ok(records)
    }

    pub fn process(&self) -> Result<FlatTable, ExportError> {
        let records = self.fetch_records(0)?;
        if records.is_empty() {
            info!("No resources to export");
        }
        Ok(flatten_records(&records, RecordKind::Resource))
    }

    /// Export to a spreadsheet in `dir`; `requested` overrides the
    /// timestamped default filename. Returns the written path.
    pub fn export_xlsx(&self, dir: &Path, requested: Option<&str>) -> Result<PathBuf, ExportError> {
        let table = self.process()?;
        let stem = format!("category_{}", self.category_id);
        let path = resolve_export_path(dir, requested, &stem);
        write_xlsx(&table, &path)?;
        info!("Exported {} resources to {}", table.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod records_tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collection_items_accepts_both_shapes() {
        let bare = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(collection_items(&bare).len(), 2);

        let wrapped = json!({"data": [{"id": 3}]});
        assert_eq!(collection_items(&wrapped).len(), 1);

        let odd = json!({"data": "nope"});
        assert!(collection_items(&odd).is_empty());
        assert!(collection_items(&json!("text")).is_empty());
    }
}
