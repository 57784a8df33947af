//! Export pipeline tests
//!
//! Drive the exporters against a scripted endpoint: paging queries,
//! category validation, flattening, and the spreadsheet on disk.

mod common;

use std::time::Duration;

use common::{FakeEndpoint, Recorded, ok_json, status, timeout};
use eln_sync_sdk::{ExperimentExporter, ExportError, PagedFetcher, ResourceExporter};
use serde_json::json;
use tempfile::TempDir;

fn query_of(recorded: &Recorded) -> Vec<(String, String)> {
    match recorded {
        Recorded::Get { query, .. } => query.clone(),
        other => panic!("expected a GET, got {:?}", other),
    }
}

fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

mod experiment_tests {
    use super::*;

    #[test]
    fn test_fetches_pages_until_short() {
        let endpoint = FakeEndpoint::new();
        endpoint
            .on("GET", "experiments", ok_json(json!([{"id": 1}, {"id": 2}])))
            .on("GET", "experiments", ok_json(json!({"data": [{"id": 3}]})));
        let exporter = ExperimentExporter::new(&endpoint)
            .with_fetcher(PagedFetcher::new(2).with_backoff(Duration::ZERO));

        let records = exporter.fetch_records(0).unwrap();

        assert_eq!(records.len(), 3);
        let requests = endpoint.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            query_of(&requests[0]),
            pairs(&[("limit", "2"), ("offset", "0")])
        );
        assert_eq!(
            query_of(&requests[1]),
            pairs(&[("limit", "2"), ("offset", "2")])
        );
    }

    #[test]
    fn test_timeout_shrinks_the_window() {
        let endpoint = FakeEndpoint::new();
        endpoint
            .on("GET", "experiments", timeout())
            .on("GET", "experiments", ok_json(json!([{"id": 1}])));
        let exporter = ExperimentExporter::new(&endpoint)
            .with_fetcher(PagedFetcher::new(4).with_backoff(Duration::ZERO));

        let records = exporter.fetch_records(0).unwrap();

        assert_eq!(records.len(), 1);
        let requests = endpoint.requests();
        assert_eq!(
            query_of(&requests[0]),
            pairs(&[("limit", "4"), ("offset", "0")])
        );
        // Same offset, halved limit.
        assert_eq!(
            query_of(&requests[1]),
            pairs(&[("limit", "2"), ("offset", "0")])
        );
    }

    #[test]
    fn test_http_error_fails_the_export() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("GET", "experiments", status(500, "boom"));
        let exporter = ExperimentExporter::new(&endpoint)
            .with_fetcher(PagedFetcher::new(2).with_backoff(Duration::ZERO));

        let err = exporter.fetch_records(0).unwrap_err();

        assert!(matches!(err, ExportError::Endpoint(ref m) if m.contains("500")));
    }

    #[test]
    fn test_process_flattens_fetched_records() {
        let endpoint = FakeEndpoint::new();
        endpoint.on(
            "GET",
            "experiments",
            ok_json(json!([{
                "id": 7,
                "title": "Run 4",
                "userid": 3,
                "body": "<p>First</p><p>Second</p>",
                "metadata": {"extra_fields": {"Storage": {"type": "text", "value": "Freezer 2"}}}
            }])),
        );
        let exporter = ExperimentExporter::new(&endpoint);

        let table = exporter.process().unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "title"), Some("Run 4"));
        assert_eq!(table.cell(0, "body"), Some("First\n\nSecond"));
        assert_eq!(table.cell(0, "Storage"), Some("Freezer 2"));
        assert_eq!(table.column_index("userid"), None);
        assert_eq!(table.column_index("metadata"), None);
    }
}

mod resource_tests {
    use super::*;

    #[test]
    fn test_validates_category_then_filters_the_fetch() {
        let endpoint = FakeEndpoint::new();
        endpoint
            .on("GET", "items_types/12", ok_json(json!({"id": 12})))
            .on("GET", "items", ok_json(json!([])));
        let exporter = ResourceExporter::new(&endpoint, "12")
            .with_fetcher(PagedFetcher::new(5).with_backoff(Duration::ZERO));

        let records = exporter.fetch_records(0).unwrap();

        assert!(records.is_empty());
        let requests = endpoint.requests();
        assert_eq!(requests.len(), 2);
        assert!(matches!(&requests[0], Recorded::Get { path, .. } if path == "items_types/12"));
        assert_eq!(
            query_of(&requests[1]),
            pairs(&[("cat", "12"), ("limit", "5"), ("offset", "0")])
        );
    }

    #[test]
    fn test_non_numeric_category_fails_before_any_request() {
        let endpoint = FakeEndpoint::new();
        let exporter = ResourceExporter::new(&endpoint, "standard");

        let err = exporter.fetch_records(0).unwrap_err();

        assert!(matches!(err, ExportError::Validation(ref m) if m.contains("standard")));
        assert_eq!(endpoint.request_count(), 0);
    }

    #[test]
    fn test_unknown_category_fails_the_export() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("GET", "items_types/99", status(404, "not found"));
        let exporter = ResourceExporter::new(&endpoint, "99");

        let err = exporter.fetch_records(0).unwrap_err();

        assert!(matches!(err, ExportError::Validation(_)));
        assert_eq!(endpoint.request_count(), 1);
    }
}

mod xlsx_tests {
    use super::*;

    #[test]
    fn test_export_writes_a_spreadsheet() {
        let endpoint = FakeEndpoint::new();
        endpoint.on(
            "GET",
            "experiments",
            ok_json(json!([{"id": 7, "title": "Run 4"}])),
        );
        let exporter = ExperimentExporter::new(&endpoint);
        let dir = TempDir::new().expect("tempdir");

        let path = exporter
            .export_xlsx(dir.path(), Some("my report"))
            .unwrap();

        assert_eq!(path, dir.path().join("my_report.xlsx"));
        assert!(path.is_file());
    }

    #[test]
    fn test_default_experiment_name_is_timestamped() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("GET", "experiments", ok_json(json!([])));
        let exporter = ExperimentExporter::new(&endpoint);
        let dir = TempDir::new().expect("tempdir");

        let path = exporter.export_xlsx(dir.path(), None).unwrap();

        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("experiments_export_"));
        assert!(name.ends_with(".xlsx"));
        assert!(path.is_file());
    }

    #[test]
    fn test_default_resource_name_carries_the_category() {
        let endpoint = FakeEndpoint::new();
        endpoint
            .on("GET", "items_types/12", ok_json(json!({"id": 12})))
            .on("GET", "items", ok_json(json!([])));
        let exporter = ResourceExporter::new(&endpoint, "12");
        let dir = TempDir::new().expect("tempdir");

        let path = exporter.export_xlsx(dir.path(), None).unwrap();

        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("category_12_"));
        assert!(path.is_file());
    }
}
