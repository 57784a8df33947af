//! Spreadsheet output
//!
//! Resolves the output path (sanitized user-supplied name or a
//! timestamp-suffixed default, always with an `.xlsx` extension) and writes
//! a [`FlatTable`] to disk.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;

use crate::export::{ExportError, FlatTable};

/// Reduce a user-supplied filename to a safe form.
///
/// Path separators become separators between name parts, whitespace runs
/// collapse to single underscores and anything outside `[A-Za-z0-9_.-]` is
/// dropped. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    cleaned.trim_matches(['.', '_']).to_string()
}

/// Build the export path inside `dir`.
///
/// A requested name is sanitized; an absent or fully-sanitized-away name
/// falls back to `{default_stem}_{timestamp}`. The `.xlsx` extension is
/// appended when missing.
pub fn resolve_export_path(dir: &Path, requested: Option<&str>, default_stem: &str) -> PathBuf {
    let mut filename = match requested.map(sanitize_filename) {
        Some(name) if !name.is_empty() => name,
        _ => format!(
            "{}_{}",
            default_stem,
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ),
    };
    if !filename.to_lowercase().ends_with(".xlsx") {
        filename.push_str(".xlsx");
    }
    dir.join(filename)
}

/// Write the table to an `.xlsx` file, creating parent directories first.
pub fn write_xlsx(table: &FlatTable, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Io(e.to_string()))?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in table.headers().iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .map_err(|e| ExportError::Xlsx(e.to_string()))?;
    }
    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet
                .write_string((row_idx + 1) as u32, col as u16, cell)
                .map_err(|e| ExportError::Xlsx(e.to_string()))?;
        }
    }
    workbook
        .save(path)
        .map_err(|e| ExportError::Xlsx(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my report.xlsx"), "my_report.xlsx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("résumé!"), "rsum");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_resolve_export_path_forces_extension() {
        let path = resolve_export_path(Path::new("/tmp"), Some("report"), "experiments_export");
        assert_eq!(path, Path::new("/tmp/report.xlsx"));

        let kept = resolve_export_path(Path::new("/tmp"), Some("report.XLSX"), "x");
        assert_eq!(kept, Path::new("/tmp/report.XLSX"));
    }

    #[test]
    fn test_resolve_export_path_default_is_timestamped() {
        let path = resolve_export_path(Path::new("."), None, "experiments_export");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("experiments_export_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn test_write_xlsx_creates_parent_dirs() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let table = FlatTable::default();
        let path = dir.path().join("nested").join("out.xlsx");
        write_xlsx(&table, &path).expect("write");
        assert!(path.is_file());
    }
}
