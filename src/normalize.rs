//! Pure value-normalization helpers shared by the importer and exporters.
//!
//! Everything in this module is a total function over strings: no I/O, no
//! endpoint access, no panics. Row-level lookups (which column holds the
//! title, and so on) live with the importer; the coercion rules live here.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::warn;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Tokens that mean "no value" wherever a cell is interpreted, compared
/// case-insensitively after trimming.
const NULL_SENTINELS: [&str; 3] = ["nan", "none", "null"];

fn is_null_sentinel(trimmed: &str) -> bool {
    let lowered = trimmed.to_lowercase();
    NULL_SENTINELS.contains(&lowered.as_str())
}

/// Replace non-breaking spaces with regular spaces and trim.
pub fn clean_cell(raw: &str) -> String {
    raw.replace('\u{a0}', " ").trim().to_string()
}

/// Clean a cell and return it only when it holds a real value.
///
/// Empty cells and null sentinels yield `None`.
pub fn non_empty(raw: &str) -> Option<String> {
    let cleaned = clean_cell(raw);
    if cleaned.is_empty() || is_null_sentinel(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize an identifier cell to a plain numeric-ish string.
///
/// Spreadsheet round-trips frequently render integer ids as floats
/// (`"5.0"`); those are coerced back to `"5"`. Empty cells and the literal
/// null tokens (`nan`, `none`, `null`, any case) become `None`. Anything
/// else is returned trimmed.
pub fn normalize_id(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() || is_null_sentinel(raw) {
        return None;
    }
    if raw.contains('.') {
        if let Ok(parsed) = raw.parse::<f64>() {
            if parsed.is_nan() {
                return None;
            }
            if parsed.is_finite() && parsed.fract() == 0.0 {
                return Some(format!("{}", parsed as i64));
            }
        }
    }
    Some(raw.to_string())
}

/// Parse a date cell against an ordered list of `strftime`-style patterns.
///
/// The first pattern that parses wins and the result is reformatted as
/// `YYYY-MM-DD`. Empty/null cells return `None` silently; a non-empty cell
/// that matches no pattern returns `None` with a warning. Never errors.
///
/// # Arguments
///
/// * `raw` - The cell content.
/// * `patterns` - Ordered parse formats, e.g. `["%d/%m/%Y", "%Y-%m-%d"]`.
pub fn normalize_date(raw: &str, patterns: &[String]) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_null_sentinel(trimmed) {
        return None;
    }
    for pattern in patterns {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, pattern) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    warn!("No configured date pattern matched value '{}', dropping it", trimmed);
    None
}

/// Split a tags cell into a list.
///
/// The cell is split on the FIRST delimiter found among `;`, `,` and `|`,
/// checked in that priority order; a value containing none of them is a
/// single tag. Parts are trimmed and empty parts dropped. Null-sentinel
/// cells yield an empty list.
///
/// # Example
///
/// ```
/// use eln_sync_sdk::normalize::parse_tags;
///
/// assert_eq!(parse_tags("a; b | c"), vec!["a", "b | c"]);
/// assert_eq!(parse_tags("solo"), vec!["solo"]);
/// ```
pub fn parse_tags(raw: &str) -> Vec<String> {
    let value = raw.trim();
    if value.is_empty() || is_null_sentinel(value) {
        return Vec::new();
    }
    let parts: Vec<&str> = match [';', ',', '|'].iter().find(|d| value.contains(**d)) {
        Some(delim) => value.split(*delim).collect(),
        None => vec![value],
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Convert a rich-text HTML body to plain text.
///
/// Each `<p>` element becomes one paragraph, paragraphs are joined with a
/// blank line in between; within a paragraph, markup collapses to single
/// spaces around the text content. A body without `<p>` elements is reduced
/// to its whole text content the same way.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let paragraphs: Vec<String> = fragment
        .select(&PARAGRAPH)
        .map(|p| joined_text(p.text()))
        .collect();
    if !paragraphs.is_empty() {
        return paragraphs.join("\n\n");
    }
    joined_text(fragment.root_element().text())
}

fn joined_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
