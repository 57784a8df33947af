//! File attachment tests
//!
//! Exercise [`FileAttacher`] against a scripted endpoint and real temp
//! directories: batching, the per-file fallback pass, and path resolution.

mod common;

use std::path::{Path, PathBuf};

use common::{FakeEndpoint, ok_json, status};
use eln_sync_sdk::{FileAttacher, ImportConfig, ImportError, RecordKind};
use serde_json::json;
use tempfile::TempDir;

fn dir_with_files(names: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    for name in names {
        std::fs::write(dir.path().join(name), b"data").expect("write file");
    }
    dir
}

mod upload_tests {
    use super::*;

    #[test]
    fn test_uploads_in_batches_of_chunk_size() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("POST", "items/42/uploads", ok_json(json!({})));
        let config = ImportConfig {
            upload_chunk_size: 2,
            ..ImportConfig::default()
        };
        let attacher = FileAttacher::new(&endpoint, RecordKind::Resource, &config);
        let dir = dir_with_files(&["a.txt", "b.txt", "c.txt"]);

        let count = attacher.attach_dir("42", dir.path()).unwrap();

        assert_eq!(count, 3);
        let uploads = endpoint.uploads("items/42/uploads");
        assert_eq!(
            uploads,
            vec![("files[]".to_string(), 2), ("files[]".to_string(), 1)]
        );
    }

    #[test]
    fn test_failed_batch_falls_back_to_per_file() {
        let endpoint = FakeEndpoint::new();
        endpoint
            .on("POST", "items/42/uploads", status(400, "bad request"))
            .on("POST", "items/42/uploads", status(400, "bad request"))
            .on("POST", "items/42/uploads", ok_json(json!({})))
            .on("POST", "items/42/uploads", ok_json(json!({})));
        let config = ImportConfig {
            upload_chunk_size: 2,
            ..ImportConfig::default()
        };
        let attacher = FileAttacher::new(&endpoint, RecordKind::Resource, &config);
        let dir = dir_with_files(&["a.txt", "b.txt"]);

        let count = attacher.attach_dir("42", dir.path()).unwrap();

        assert_eq!(count, 2);
        // One failed batch, then per file: a.txt needs the alternate field
        // name, b.txt goes through on the first try.
        let uploads = endpoint.uploads("items/42/uploads");
        assert_eq!(
            uploads,
            vec![
                ("files[]".to_string(), 2),
                ("files[]".to_string(), 1),
                ("file".to_string(), 1),
                ("files[]".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_persistent_failures_are_aggregated() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("POST", "items/42/uploads", status(500, "nope"));
        let config = ImportConfig {
            upload_chunk_size: 1,
            ..ImportConfig::default()
        };
        let attacher = FileAttacher::new(&endpoint, RecordKind::Resource, &config);
        let dir = dir_with_files(&["a.txt", "b.txt"]);

        let err = attacher.attach_dir("42", dir.path()).unwrap_err();

        let ImportError::Upload(message) = err else {
            panic!("expected an upload error");
        };
        assert!(message.contains("One or more uploads failed"));
        assert!(message.contains("a.txt"));
        assert!(message.contains("b.txt"));
        // Chunk size 1 skips batching; each file tries both field names.
        assert_eq!(endpoint.uploads("items/42/uploads").len(), 4);
    }

    #[test]
    fn test_empty_folder_uploads_nothing() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = FileAttacher::new(&endpoint, RecordKind::Resource, &config);
        let dir = TempDir::new().expect("tempdir");

        assert_eq!(attacher.attach_dir("42", dir.path()).unwrap(), 0);
        assert_eq!(endpoint.request_count(), 0);
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = FileAttacher::new(&endpoint, RecordKind::Resource, &config);
        let dir = dir_with_files(&["a.txt"]);

        let err = attacher.attach_dir("new", dir.path()).unwrap_err();

        assert!(matches!(err, ImportError::Upload(ref m) if m.contains("Invalid record ID")));
        assert_eq!(endpoint.request_count(), 0);
    }

    #[test]
    fn test_single_file_must_exist() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = FileAttacher::new(&endpoint, RecordKind::Experiment, &config);
        let dir = TempDir::new().expect("tempdir");

        let err = attacher
            .attach_single_file("7", &dir.path().join("missing.pdf"))
            .unwrap_err();

        assert!(matches!(err, ImportError::Upload(ref m) if m.contains("File not found")));
        assert_eq!(endpoint.request_count(), 0);
    }

    #[test]
    fn test_single_file_upload_hits_the_uploads_path() {
        let endpoint = FakeEndpoint::new();
        endpoint.on("POST", "experiments/7/uploads", ok_json(json!({})));
        let config = ImportConfig::default();
        let attacher = FileAttacher::new(&endpoint, RecordKind::Experiment, &config);
        let dir = dir_with_files(&["report.pdf"]);

        attacher
            .attach_single_file("7", &dir.path().join("report.pdf"))
            .unwrap();

        assert_eq!(
            endpoint.uploads("experiments/7/uploads"),
            vec![("files[]".to_string(), 1)]
        );
    }
}

mod resolve_tests {
    use super::*;

    fn make_attacher<'a>(
        endpoint: &'a FakeEndpoint,
        config: &'a ImportConfig,
    ) -> FileAttacher<'a, FakeEndpoint> {
        FileAttacher::new(endpoint, RecordKind::Resource, config)
    }

    #[test]
    fn test_bare_word_is_not_a_path() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = make_attacher(&endpoint, &config);

        assert_eq!(attacher.resolve_folder("notes"), None);
        assert_eq!(attacher.resolve_folder(""), None);
        assert_eq!(attacher.resolve_folder("nan"), None);
    }

    #[test]
    fn test_separators_and_dotted_names_look_like_paths() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = make_attacher(&endpoint, &config);

        assert_eq!(
            attacher.resolve_folder("data/run1"),
            Some(PathBuf::from("data/run1"))
        );
        assert_eq!(
            attacher.resolve_folder("report.pdf"),
            Some(PathBuf::from("report.pdf"))
        );
        assert_eq!(
            attacher.resolve_folder("/srv/shared"),
            Some(PathBuf::from("/srv/shared"))
        );
    }

    #[test]
    fn test_relative_paths_join_the_base_dir() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig {
            attachment_base_dir: Some(PathBuf::from("/srv/attachments")),
            ..ImportConfig::default()
        };
        let attacher = make_attacher(&endpoint, &config);

        // With a base directory configured, even a bare name resolves.
        assert_eq!(
            attacher.resolve_folder("run1"),
            Some(PathBuf::from("/srv/attachments/run1"))
        );
        // Absolute paths are left alone.
        assert_eq!(
            attacher.resolve_folder("/elsewhere/run2"),
            Some(PathBuf::from("/elsewhere/run2"))
        );
    }

    #[test]
    fn test_missing_path_is_reported_inside_attach_dir() {
        let endpoint = FakeEndpoint::new();
        let config = ImportConfig::default();
        let attacher = make_attacher(&endpoint, &config);

        // A resolvable but nonexistent folder yields zero uploads.
        assert_eq!(
            attacher
                .attach_dir("42", Path::new("/definitely/not/here"))
                .unwrap(),
            0
        );
        assert_eq!(endpoint.request_count(), 0);
    }
}
