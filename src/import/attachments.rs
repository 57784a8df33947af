//! File attachment for created records
//!
//! Resolves the attachment column of a CSV row to a folder or file and
//! uploads its contents to the record's `uploads` sub-endpoint. Uploads are
//! batched; a failing batch falls back to a per-file pass with a second
//! attempt under the alternate form field name some server versions expect.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::ImportConfig;
use crate::endpoint::{Endpoint, UploadBatch};
use crate::import::ImportError;
use crate::models::RecordKind;
use crate::normalize::non_empty;

pub struct FileAttacher<'a, E: Endpoint> {
    endpoint: &'a E,
    kind: RecordKind,
    base_dir: Option<PathBuf>,
    chunk_size: usize,
}

impl<'a, E: Endpoint> FileAttacher<'a, E> {
    pub fn new(endpoint: &'a E, kind: RecordKind, config: &ImportConfig) -> Self {
        Self {
            endpoint,
            kind,
            base_dir: config.attachment_base_dir.clone(),
            chunk_size: config.upload_chunk_size,
        }
    }

    /// Interpret a raw cell value as an attachment path.
    ///
    /// Returns `None` for empty/null cells and for values that do not look
    /// like a path at all (no separator, not absolute, no dotted basename
    /// and no base directory configured); those are logged and skipped
    /// rather than treated as errors. Relative paths are joined onto the
    /// configured base directory.
    pub fn resolve_folder(&self, raw: &str) -> Option<PathBuf> {
        let cleaned = non_empty(raw)?;
        let candidate = Path::new(&cleaned);
        let dotted_basename = candidate
            .file_name()
            .map(|name| name.to_string_lossy().contains('.'))
            .unwrap_or(false);
        let looks_like_path = cleaned.contains('/')
            || cleaned.contains('\\')
            || candidate.is_absolute()
            || dotted_basename
            || self.base_dir.is_some();
        if !looks_like_path {
            info!("Skipping files upload: value does not look like a path: '{}'", cleaned);
            return None;
        }
        let mut path = PathBuf::from(&cleaned);
        if path.is_relative()
            && let Some(base) = &self.base_dir
        {
            path = base.join(path);
        }
        Some(path)
    }

    /// Upload every file under `folder` (recursively) to the record.
    ///
    /// Files go up in batches of the configured chunk size first. If any
    /// batch fails, the whole list is retried file by file, each with a
    /// fallback to the single-file field name; the errors that remain are
    /// aggregated into one failure.
    pub fn attach_dir(&self, id: &str, folder: &Path) -> Result<usize, ImportError> {
        require_numeric_id(id)?;
        let files = collect_files(folder);
        if files.is_empty() {
            warn!("No files to upload from: {}", folder.display());
            return Ok(0);
        }
        let path = self.uploads_path(id);

        if self.chunk_size > 1 {
            let mut all_batches_ok = true;
            for batch in files.chunks(self.chunk_size) {
                match self.endpoint.upload(&path, &UploadBatch::multi(batch.to_vec())) {
                    Ok(response) if response.is_success() => {}
                    Ok(response) => {
                        info!(
                            "Batched upload ({} files) failed: status {}",
                            batch.len(),
                            response.status
                        );
                        all_batches_ok = false;
                        break;
                    }
                    Err(err) => {
                        info!("Batched upload ({} files) failed: {}", batch.len(), err);
                        all_batches_ok = false;
                        break;
                    }
                }
            }
            if all_batches_ok {
                info!(
                    "Uploaded {} files in {} batch(es)",
                    files.len(),
                    files.len().div_ceil(self.chunk_size)
                );
                return Ok(files.len());
            }
        }

        let mut errors: Vec<String> = Vec::new();
        for file in &files {
            if let Err(reason) = self.send_with_fallback(&path, file) {
                error!(
                    "Failed to upload file {} to {} {}: {}",
                    file.display(),
                    self.kind.label(),
                    id,
                    reason
                );
                errors.push(format!("{}: {}", file.display(), reason));
            }
        }
        if !errors.is_empty() {
            return Err(ImportError::Upload(format!(
                "One or more uploads failed:\n- {}",
                errors.join("\n- ")
            )));
        }
        Ok(files.len())
    }

    /// Upload a single file to the record. The file must exist.
    pub fn attach_single_file(&self, id: &str, file: &Path) -> Result<(), ImportError> {
        require_numeric_id(id)?;
        if !file.is_file() {
            return Err(ImportError::Upload(format!(
                "File not found: {}",
                file.display()
            )));
        }
        let path = self.uploads_path(id);
        self.send_with_fallback(&path, file)
            .map_err(|reason| {
                ImportError::Upload(format!("{}: {}", file.display(), reason))
            })?;
        info!("Uploaded {} to {} {}", file.display(), self.kind.label(), id);
        Ok(())
    }

    fn uploads_path(&self, id: &str) -> String {
        format!("{}/{}/uploads", self.kind.collection(), id)
    }

    /// Try the multi-file field name first, then the single-file one.
    fn send_with_fallback(&self, path: &str, file: &Path) -> Result<(), String> {
        match self.send_single(path, file, "files[]") {
            Ok(()) => Ok(()),
            Err(_) => self.send_single(path, file, "file"),
        }
    }

    fn send_single(&self, path: &str, file: &Path, field: &str) -> Result<(), String> {
        match self
            .endpoint
            .upload(path, &UploadBatch::single(file.to_path_buf(), field))
        {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(format!("status {}: {}", response.status, response.body)),
            Err(err) => Err(err.to_string()),
        }
    }
}

fn require_numeric_id(id: &str) -> Result<(), ImportError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ImportError::Upload(format!(
            "Invalid record ID for upload: {:?}",
            id
        )));
    }
    Ok(())
}

/// All regular files under `dir`, recursively, in sorted order.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!(
            "Files folder does not exist or is not a directory: {}",
            dir.display()
        );
        return Vec::new();
    }
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&current) else {
            warn!("Could not read directory: {}", current.display());
            continue;
        };
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                pending.push(entry_path);
            } else if entry_path.is_file() {
                files.push(entry_path);
            }
        }
    }
    files.sort();
    if files.is_empty() {
        warn!("No files found in folder: {}", dir.display());
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_numeric_id() {
        assert!(require_numeric_id("42").is_ok());
        assert!(require_numeric_id("").is_err());
        assert!(require_numeric_id("4a").is_err());
    }

    #[test]
    fn test_collect_files_recurses_and_sorts() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).expect("mkdir");
        std::fs::write(dir.path().join("b.txt"), "b").expect("write");
        std::fs::write(sub.join("a.txt"), "a").expect("write");

        let files = collect_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("b.txt"));
        assert!(files[1].ends_with("sub/a.txt"));
    }

    #[test]
    fn test_collect_files_missing_dir() {
        assert!(collect_files(Path::new("/definitely/not/here")).is_empty());
    }
}
