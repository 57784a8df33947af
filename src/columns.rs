//! Column name canonicalization and fuzzy header lookup.
//!
//! CSV headers arrive in every imaginable spelling (`Category ID`,
//! `category_id`, `Category-Id`). All lookups in the importer go through a
//! [`ColumnIndex`] built once per loaded table, so the matching rule lives in
//! exactly one place.

use tracing::warn;

/// Normalize a column or field name for fuzzy matching.
///
/// Lower-cases the input and removes spaces, tabs, underscores and hyphens.
/// The function is total and idempotent: canonicalizing an already canonical
/// name returns it unchanged.
///
/// # Example
///
/// ```
/// use eln_sync_sdk::columns::canonicalize;
///
/// assert_eq!(canonicalize("Category ID"), "categoryid");
/// assert_eq!(canonicalize("category_id"), "categoryid");
/// ```
pub fn canonicalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '_' | '-'))
        .collect()
}

/// Mapping from canonical header names to the original spellings, preserving
/// the header order of the source table.
///
/// Duplicate canonical keys keep the first original and log a warning; the
/// winner is deterministic (first in input order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnIndex {
    entries: Vec<(String, String)>,
}

impl ColumnIndex {
    /// Build the index from the raw header sequence of a loaded table.
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for header in headers {
            let original = header.as_ref();
            let canon = canonicalize(original);
            match entries.iter().find(|(key, _)| *key == canon) {
                Some((_, first)) if first != original => {
                    warn!(
                        "Canonical column collision: '{}' vs '{}' for key '{}', keeping the first",
                        first, original, canon
                    );
                }
                Some(_) => {}
                None => entries.push((canon, original.to_string())),
            }
        }
        Self { entries }
    }

    /// Look up the original header for an exact canonical key.
    pub fn original(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == canonical)
            .map(|(_, original)| original.as_str())
    }

    /// Fuzzy lookup: exact canonical match first, then substring containment
    /// in both directions, returning the first hit in header order.
    ///
    /// `None` means the feature is absent from the table, never an error.
    ///
    /// # Arguments
    ///
    /// * `target` - The name to look for, in any spelling.
    pub fn find_like(&self, target: &str) -> Option<&str> {
        let key = canonicalize(target);
        if key.is_empty() {
            return None;
        }
        if let Some(original) = self.original(&key) {
            return Some(original);
        }
        self.entries
            .iter()
            .find(|(canon, _)| canon.contains(&key) || key.contains(canon.as_str()))
            .map(|(_, original)| original.as_str())
    }

    /// Iterate `(canonical, original)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(canon, original)| (canon.as_str(), original.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
