//! Low-level CSV decoding: encoding fallback, text normalization and
//! delimiter sniffing.

use encoding_rs::WINDOWS_1252;

use super::TableError;

/// Candidates checked for cross-line consistency, in sniff order.
const SNIFF_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];
/// Fallback priority when sniffing is inconclusive.
const FALLBACK_PRIORITY: [char; 4] = [';', '\t', '|', ','];
/// Lines sampled for the consistency check.
const SNIFF_LINES: usize = 5;

/// Decode raw file bytes to text: strict UTF-8 first, windows-1252 as the
/// fallback for legacy lab exports.
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Strip the BOM, replace non-breaking spaces with regular spaces and unify
/// line endings. These characters routinely confuse both sniffing and
/// downstream column matching.
pub fn normalize_text(text: &str) -> String {
    text.replace('\u{feff}', "")
        .replace('\u{a0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

/// Sniff the delimiter from a normalized sample.
///
/// A candidate whose occurrence count is non-zero and identical across the
/// first few non-empty lines wins (most occurrences first). Otherwise fall
/// back to a frequency count over the header line in priority order,
/// requiring at least two occurrences, and default to `;` if inconclusive.
pub fn detect_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some(header) = lines.first() else {
        return b';';
    };

    let mut best: Option<(char, usize)> = None;
    for candidate in SNIFF_CANDIDATES {
        let count = header.matches(candidate).count();
        if count == 0 {
            continue;
        }
        if lines.iter().all(|line| line.matches(candidate).count() == count)
            && best.is_none_or(|(_, c)| count > c)
        {
            best = Some((candidate, count));
        }
    }
    if let Some((delimiter, _)) = best {
        return delimiter as u8;
    }

    let mut fallback = (';', 0usize);
    for candidate in FALLBACK_PRIORITY {
        let count = header.matches(candidate).count();
        if count > fallback.1 {
            fallback = (candidate, count);
        }
    }
    if fallback.1 >= 2 { fallback.0 as u8 } else { b';' }
}

/// Parse normalized text into a header row plus data records.
///
/// Records are padded or truncated to the header width; fully empty lines
/// are skipped. An absent or blank header row is an error.
pub fn parse_records(
    text: &str,
    delimiter: u8,
) -> Result<(Vec<String>, Vec<Vec<String>>), TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::Parse(e.to_string()))?
        .iter()
        .map(String::from)
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TableError::MissingHeader(
            "input has no usable header row".to_string(),
        ));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TableError::Parse(e.to_string()))?;
        let mut values: Vec<String> = record.iter().map(String::from).collect();
        if values.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        values.resize(headers.len(), String::new());
        records.push(values);
    }
    Ok((headers, records))
}
