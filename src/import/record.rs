//! CSV-to-record reconciliation
//!
//! [`RecordImporter`] drives one import run: it loads a CSV table, resolves
//! the special columns (id, category, date, attachment path) once, then
//! walks the rows. A row without an id creates a record; a row with one
//! patches the existing record. Both paths finish by reconciling the row's
//! remaining columns against the record's extra-field definitions.

use std::collections::HashSet;
use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::columns::canonicalize;
use crate::config::ImportConfig;
use crate::endpoint::Endpoint;
use crate::import::{attachments::FileAttacher, ImportError, ImportReport, RowFailure};
use crate::models::{FieldValue, Metadata, RecordKind};
use crate::normalize::{non_empty, normalize_date, normalize_id, parse_tags};
use crate::table::{CsvRow, CsvTable};

pub struct RecordImporter<'a, E: Endpoint> {
    endpoint: &'a E,
    kind: RecordKind,
    config: &'a ImportConfig,
    table: CsvTable,
    category_col: Option<String>,
    path_col: Option<String>,
    date_col: Option<String>,
    template: Option<String>,
}

impl<'a, E: Endpoint> RecordImporter<'a, E> {
    /// Build an importer over an already-parsed table.
    pub fn new(endpoint: &'a E, kind: RecordKind, config: &'a ImportConfig, table: CsvTable) -> Self {
        let columns = table.columns();
        // One-way containment: a bare "id" header must not pass for the category.
        let category_col = columns
            .iter()
            .find(|(canon, _)| canon.contains("categoryid"))
            .map(|(_, original)| original.to_string());
        let path_aliases: Vec<String> = config
            .path_col_aliases
            .iter()
            .map(|alias| canonicalize(alias))
            .collect();
        let path_col = columns
            .iter()
            .find(|(canon, _)| path_aliases.iter().any(|alias| alias.as_str() == *canon))
            .map(|(_, original)| original.to_string());
        let date_col = columns.find_like("date").map(String::from);
        Self {
            endpoint,
            kind,
            config,
            table,
            category_col,
            path_col,
            date_col,
            template: None,
        }
    }

    /// Load the CSV file at `path` and build an importer over it.
    pub fn from_csv(
        endpoint: &'a E,
        kind: RecordKind,
        config: &'a ImportConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, ImportError> {
        let table = CsvTable::from_path(path)?;
        Ok(Self::new(endpoint, kind, config, table))
    }

    /// Template id applied to created records.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn table(&self) -> &CsvTable {
        &self.table
    }

    /// Import every row, dispatching create vs patch on the id column.
    ///
    /// A failing row is logged and counted but does not stop the run.
    /// Id-parsing and category-validation failures are contract violations
    /// and abort the whole run instead.
    pub fn import_csv(&self) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();
        for row in self.table.rows() {
            let row_id = self.row_id(&row);
            let outcome = match row_id.as_deref() {
                None => self.create_new(&row).map(|id| (id, true)),
                Some(id) => self.patch_existing(id, &row).map(|_| (id.to_string(), false)),
            };
            match outcome {
                Ok((id, created)) => {
                    if created {
                        report.created += 1;
                    } else {
                        report.patched += 1;
                    }
                    report.record_ids.push(id);
                }
                Err(err @ (ImportError::IdParse(_) | ImportError::InvalidCategory(_))) => {
                    return Err(err);
                }
                Err(err) => {
                    error!("Row {} failed: {}", row.index(), err);
                    report.failed += 1;
                    report.failures.push(RowFailure {
                        row: row.index(),
                        id: row_id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!("Import finished: {}", report.summary());
        Ok(report)
    }

    /// Create a record from a row, attach any files, then reconcile extra
    /// fields. Returns the new record's id.
    pub fn create_new(&self, row: &CsvRow<'_>) -> Result<String, ImportError> {
        let payload = self.create_payload(row);
        let response = self.endpoint.post(self.kind.collection(), &payload)?;
        if !response.is_success() {
            let title = payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("<unknown title>");
            return Err(ImportError::Endpoint(format!(
                "Creation of {:?} failed with status {}: {}",
                title, response.status, response.body
            )));
        }
        let id = parse_location_id(response.location.as_deref())?;
        info!("Created {} {}", self.kind.label(), id);

        if let Some(path_col) = &self.path_col
            && let Some(raw) = row.get(path_col)
        {
            let attacher = FileAttacher::new(self.endpoint, self.kind, self.config);
            if let Some(resolved) = attacher.resolve_folder(raw) {
                if resolved.is_dir() {
                    attacher.attach_dir(&id, &resolved)?;
                } else if resolved.is_file() {
                    attacher.attach_single_file(&id, &resolved)?;
                } else {
                    warn!(
                        "Attachment path does not exist: {}",
                        resolved.display()
                    );
                }
            }
        }

        self.patch_extra_fields(&id, row)?;
        Ok(id)
    }

    /// Patch an existing record from a row: partial update of the known
    /// fields, then the extra-field reconciliation against the record's
    /// current state.
    pub fn patch_existing(&self, id: &str, row: &CsvRow<'_>) -> Result<(), ImportError> {
        let existing = self.fetch_existing(id);

        let mut payload = Map::new();
        if let Some(title) = self.row_value(row, "title") {
            payload.insert("title".to_string(), json!(title));
        }
        let tags = self.row_tags(row);
        if !tags.is_empty() {
            payload.insert("tags".to_string(), json!(tags));
        }
        if let Some(body) = self.row_body(row) {
            payload.insert("body".to_string(), json!(body));
        }
        if let Some(category) = self.row_category(row)? {
            payload.insert("category".to_string(), json!(category));
        }
        if let Some(date) = self.row_date(row) {
            payload.insert("date".to_string(), json!(date));
        }

        if !payload.is_empty() {
            let path = format!("{}/{}", self.kind.collection(), id);
            let response = self.endpoint.patch(&path, &Value::Object(payload))?;
            if !response.is_success() {
                return Err(ImportError::Endpoint(format!(
                    "Patch of {} {} failed with status {}: {}",
                    self.kind.label(),
                    id,
                    response.status,
                    response.body
                )));
            }
            info!("Patched {} {}", self.kind.label(), id);
        }

        self.reconcile_extra_fields(id, row, &existing)
    }

    /// Fetch the record's current state and reconcile the row's extra
    /// fields against it. Used after create, where the fetch cannot happen
    /// until the record exists.
    pub fn patch_extra_fields(&self, id: &str, row: &CsvRow<'_>) -> Result<(), ImportError> {
        let existing = self.fetch_existing(id);
        self.reconcile_extra_fields(id, row, &existing)
    }

    /// Reconcile a row's non-known columns against the record's extra-field
    /// definitions and PATCH the mutated metadata back.
    ///
    /// No matching columns, or none that produce a valid value, means no
    /// network call at all.
    fn reconcile_extra_fields(
        &self,
        id: &str,
        row: &CsvRow<'_>,
        existing: &Value,
    ) -> Result<(), ImportError> {
        let mut metadata = Metadata::from_raw(existing.get("metadata"));
        let index = metadata.canonical_index();
        let excluded = self.excluded_columns();

        let mut changed = 0usize;
        for (header, raw) in row.cells() {
            let canon = canonicalize(header);
            if excluded.contains(&canon) {
                continue;
            }
            let Some(value) = non_empty(raw) else { continue };
            match index.iter().find(|(key, _)| *key == canon) {
                Some((_, real_key)) => match metadata.coerce_value(real_key, &value) {
                    Some(coerced) => {
                        metadata.set_value(real_key, coerced);
                        changed += 1;
                    }
                    None => info!(
                        "Skipping field '{}': value '{}' not valid for options",
                        real_key, value
                    ),
                },
                None if self.config.promote_unknown_columns => {
                    metadata.set_value(header, FieldValue::Scalar(value));
                    changed += 1;
                }
                None => warn!(
                    "Column '{}' matches no extra field on {} {}, skipping",
                    header,
                    self.kind.label(),
                    id
                ),
            }
        }

        if changed == 0 {
            info!(
                "No matching extra fields to update for {} {}",
                self.kind.label(),
                id
            );
            return Ok(());
        }

        // The remote contract wants metadata as a JSON string, not an object.
        let payload = json!({ "metadata": metadata.to_json_string() });
        let path = format!("{}/{}", self.kind.collection(), id);
        let response = self.endpoint.patch(&path, &payload)?;
        if !response.is_success() {
            return Err(ImportError::Endpoint(format!(
                "Failed to patch extra fields for {} {}: {} {}",
                self.kind.label(),
                id,
                response.status,
                response.body
            )));
        }
        info!(
            "Updated {} extra field(s) on {} {}",
            changed,
            self.kind.label(),
            id
        );
        Ok(())
    }

    /// Fetch the record's current JSON; anything unfetchable counts as an
    /// empty object.
    fn fetch_existing(&self, id: &str) -> Value {
        let path = format!("{}/{}", self.kind.collection(), id);
        match self.endpoint.get(&path, &[]) {
            Ok(response) if response.is_success() => match response.json() {
                Ok(value @ Value::Object(_)) => value,
                Ok(_) | Err(_) => {
                    warn!("Existing JSON for id {} is not an object", id);
                    json!({})
                }
            },
            Ok(response) => {
                warn!(
                    "Failed to fetch existing JSON for id {}: status {}",
                    id, response.status
                );
                json!({})
            }
            Err(err) => {
                warn!("Failed to fetch existing JSON for id {}: {}", id, err);
                json!({})
            }
        }
    }

    fn create_payload(&self, row: &CsvRow<'_>) -> Value {
        let mut payload = Map::new();
        if let Some(title) = self.row_value(row, "title") {
            payload.insert("title".to_string(), json!(title));
        }
        let tags = self.row_tags(row);
        if !tags.is_empty() {
            payload.insert("tags".to_string(), json!(tags));
        }
        if let Some(template) = &self.template {
            payload.insert("template".to_string(), id_value(template));
        }
        if let Some(body) = self.row_body(row) {
            payload.insert("body".to_string(), json!(body));
        }
        if let Some(date) = self.row_date(row) {
            payload.insert("date".to_string(), json!(date));
        }
        Value::Object(payload)
    }

    /// Canonical column names never treated as extra fields: the known
    /// top-level attributes plus the resolved id/category/date/path columns.
    fn excluded_columns(&self) -> HashSet<String> {
        let mut excluded: HashSet<String> = self
            .config
            .known_post_fields
            .iter()
            .map(|field| canonicalize(field))
            .collect();
        excluded.insert("id".to_string());
        excluded.insert(canonicalize(self.kind.id_column_alias()));
        for col in [&self.category_col, &self.path_col, &self.date_col]
            .into_iter()
            .flatten()
        {
            excluded.insert(canonicalize(col));
        }
        excluded
    }

    fn row_id(&self, row: &CsvRow<'_>) -> Option<String> {
        let columns = self.table.columns();
        let id_col = columns
            .original("id")
            .or_else(|| columns.original(&canonicalize(self.kind.id_column_alias())))?;
        normalize_id(row.get(id_col))
    }

    /// Exact-canonical column lookup returning the cleaned cell value.
    fn row_value(&self, row: &CsvRow<'_>, column: &str) -> Option<String> {
        let original = self.table.columns().original(column)?;
        non_empty(row.get(original)?)
    }

    fn row_tags(&self, row: &CsvRow<'_>) -> Vec<String> {
        match self.row_value(row, "tags") {
            Some(raw) => parse_tags(&raw),
            None => Vec::new(),
        }
    }

    fn row_body(&self, row: &CsvRow<'_>) -> Option<String> {
        let col = self.table.columns().find_like("body")?;
        non_empty(row.get(col)?)
    }

    fn row_date(&self, row: &CsvRow<'_>) -> Option<String> {
        let col = self.date_col.as_deref()?;
        let raw = row.get(col)?;
        normalize_date(raw, &self.config.date_patterns)
    }

    /// The validated category id from the row, or `None` when the column is
    /// absent or empty. A non-numeric id aborts the run.
    fn row_category(&self, row: &CsvRow<'_>) -> Result<Option<String>, ImportError> {
        let Some(col) = self.category_col.as_deref() else {
            return Ok(None);
        };
        let Some(cid) = normalize_id(row.get(col)) else {
            return Ok(None);
        };
        if !cid.chars().all(|c| c.is_ascii_digit()) {
            return Err(ImportError::InvalidCategory(cid));
        }
        Ok(Some(cid))
    }
}

/// Extract the new record id from a creation response's `Location` header.
///
/// The last path segment must be all digits; anything else is a contract
/// violation.
fn parse_location_id(location: Option<&str>) -> Result<String, ImportError> {
    let trimmed = location.unwrap_or_default().trim_end_matches('/');
    let id = trimmed.rsplit('/').next().unwrap_or_default();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ImportError::IdParse(id.to_string()));
    }
    Ok(id.to_string())
}

/// Ids arrive as ints or strings depending on the caller; keep numeric
/// spellings numeric in JSON payloads.
fn id_value(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(raw),
    }
}
