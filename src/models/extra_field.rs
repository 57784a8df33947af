//! Typed extra-field metadata and its JSON codec.
//!
//! The remote API stores per-record metadata as a blob with an
//! `extra_fields` mapping keyed by display title. Field definitions are
//! owned by the server; the client only ever overwrites `value` slots. The
//! types here keep the core logic free of raw JSON: decoding happens once
//! when a record is fetched, encoding once when a PATCH body is built, and
//! every attribute the client does not model is carried through untouched.

use serde_json::{Map, Value};
use tracing::warn;

use crate::columns::canonicalize;

/// The typed shape of a field definition, derived from its `type`,
/// `options` and `allow_multi_values` attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free-text and anything without a recognized `type`.
    Text,
    /// A `select` field constrained to `options`.
    Select { options: Vec<String>, multi: bool },
    /// A declared type this client does not interpret; treated as text.
    Other(String),
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Scalar(s) => Value::String(s.clone()),
            FieldValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// Split a raw multi-value cell on `;`/`,`, normalizing non-breaking spaces
/// first. Parts are trimmed and empties dropped.
pub fn split_multi(raw: &str) -> Vec<String> {
    let cleaned = raw.replace('\u{a0}', " ").replace(';', ",");
    cleaned
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

impl FieldKind {
    fn from_attrs(attrs: &Map<String, Value>) -> Self {
        let declared = attrs.get("type").and_then(Value::as_str);
        match declared {
            Some("select") => {
                let options = attrs
                    .get("options")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(|o| o.trim().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                let multi = attrs.get("allow_multi_values").is_some_and(is_truthy);
                FieldKind::Select { options, multi }
            }
            Some("text") | None => FieldKind::Text,
            Some(other) => FieldKind::Other(other.to_string()),
        }
    }

    /// Coerce a raw CSV string into a value valid for this field.
    ///
    /// For `select` fields the raw value is split into candidate tokens;
    /// each token is matched against the options exactly first, then
    /// case-insensitively. Multi-valued fields collect every match,
    /// deduplicated in first-seen order (an empty list is a valid result).
    /// Single-valued fields take the first token that matches; `None` means
    /// no option matched and the caller must skip the field. Every other
    /// kind passes the raw string through unchanged.
    pub fn coerce(&self, raw: &str) -> Option<FieldValue> {
        match self {
            FieldKind::Select { options, multi } => {
                let mut picked: Vec<String> = Vec::new();
                for token in split_multi(raw) {
                    let lowered = token.to_lowercase();
                    let matched = options
                        .iter()
                        .find(|option| option.as_str() == token)
                        .or_else(|| options.iter().find(|option| option.to_lowercase() == lowered));
                    if let Some(option) = matched {
                        if *multi {
                            if !picked.contains(option) {
                                picked.push(option.clone());
                            }
                        } else {
                            return Some(FieldValue::Scalar(option.clone()));
                        }
                    }
                }
                if *multi {
                    Some(FieldValue::List(picked))
                } else {
                    None
                }
            }
            FieldKind::Text | FieldKind::Other(_) => Some(FieldValue::Scalar(raw.to_string())),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => false,
    }
}

/// Decode a raw `value` attribute into its typed form: the inverse of
/// [`FieldValue::to_value`]. Anything outside that image (numbers, objects,
/// arrays with non-string items) is unmodeled and stays in `value_raw`.
fn decode_value(raw: &Value) -> Option<FieldValue> {
    match raw {
        Value::String(s) => Some(FieldValue::Scalar(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(String::from))
            .collect::<Option<Vec<String>>>()
            .map(FieldValue::List),
        _ => None,
    }
}

/// One field definition: the typed view plus every unmodeled attribute,
/// carried for lossless re-serialization.
#[derive(Debug, Clone)]
pub struct ExtraField {
    kind: FieldKind,
    value: Option<FieldValue>,
    value_raw: Option<Value>,
    attrs: Map<String, Value>,
}

impl ExtraField {
    fn from_object(object: &Map<String, Value>) -> Self {
        let mut attrs = object.clone();
        let value_raw = attrs.remove("value");
        let kind = FieldKind::from_attrs(&attrs);
        let value = value_raw.as_ref().and_then(decode_value);
        Self {
            kind,
            value,
            value_raw,
            attrs,
        }
    }

    /// A bare definition holding only a value, used when a value is written
    /// into a slot that had no definition object.
    fn with_value(value: FieldValue) -> Self {
        Self {
            kind: FieldKind::Text,
            value: Some(value),
            value_raw: None,
            attrs: Map::new(),
        }
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: FieldValue) {
        self.value = Some(value);
        self.value_raw = None;
    }

    fn to_value(&self) -> Value {
        let mut object = self.attrs.clone();
        if let Some(value) = &self.value {
            object.insert("value".to_string(), value.to_value());
        } else if let Some(raw) = &self.value_raw {
            object.insert("value".to_string(), raw.clone());
        }
        Value::Object(object)
    }
}

#[derive(Debug, Clone)]
enum FieldSlot {
    Parsed(ExtraField),
    /// An `extra_fields` entry that is not an object; kept verbatim until a
    /// write replaces it.
    Raw(Value),
}

/// A record's decoded metadata blob.
///
/// Keeps the `extra_fields` mapping in server order plus all sibling
/// metadata keys, so a PATCH round-trip never drops server-side state.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    fields: Vec<(String, FieldSlot)>,
    rest: Map<String, Value>,
}

impl Metadata {
    /// Decode the `metadata` attribute of a fetched record.
    ///
    /// The remote API serves metadata either as a JSON string or as a
    /// nested object, and some records carry none at all; anything
    /// undecodable counts as empty.
    pub fn from_raw(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::Object(object)) => Self::from_object(object),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(object)) => Self::from_object(&object),
                Ok(_) | Err(_) => {
                    if !text.trim().is_empty() {
                        warn!("Metadata string is not a JSON object, treating as empty");
                    }
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let mut fields = Vec::new();
        let mut rest = Map::new();
        for (key, value) in object {
            if key == "extra_fields" {
                if let Value::Object(entries) = value {
                    for (name, slot) in entries {
                        let slot = match slot {
                            Value::Object(def) => FieldSlot::Parsed(ExtraField::from_object(def)),
                            other => FieldSlot::Raw(other.clone()),
                        };
                        fields.push((name.clone(), slot));
                    }
                } else if !value.is_null() {
                    // Unrecognized shape; preserved verbatim, no fields.
                    rest.insert(key.clone(), value.clone());
                }
            } else {
                rest.insert(key.clone(), value.clone());
            }
        }
        Self { fields, rest }
    }

    /// `(canonical key, original key)` pairs in server order, first-wins on
    /// canonical collisions.
    pub fn canonical_index(&self) -> Vec<(String, String)> {
        let mut index: Vec<(String, String)> = Vec::new();
        for (key, _) in &self.fields {
            let canon = canonicalize(key);
            if !index.iter().any(|(existing, _)| *existing == canon) {
                index.push((canon, key.clone()));
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.rest.is_empty()
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == key)
    }

    pub fn field(&self, key: &str) -> Option<&ExtraField> {
        self.fields.iter().find_map(|(name, slot)| match slot {
            FieldSlot::Parsed(field) if name == key => Some(field),
            _ => None,
        })
    }

    /// Coerce a raw string for the named field per its definition.
    ///
    /// A slot without a parseable definition coerces as free text, exactly
    /// as if the definition were empty.
    pub fn coerce_value(&self, key: &str, raw: &str) -> Option<FieldValue> {
        match self.field(key) {
            Some(field) => field.kind().coerce(raw),
            None => FieldKind::Text.coerce(raw),
        }
    }

    /// Write a value into the named field, creating the entry if absent and
    /// replacing a non-object slot with a bare `{value}` definition.
    pub fn set_value(&mut self, key: &str, value: FieldValue) {
        for (name, slot) in &mut self.fields {
            if name == key {
                match slot {
                    FieldSlot::Parsed(field) => field.set_value(value),
                    FieldSlot::Raw(_) => *slot = FieldSlot::Parsed(ExtraField::with_value(value)),
                }
                return;
            }
        }
        self.fields
            .push((key.to_string(), FieldSlot::Parsed(ExtraField::with_value(value))));
    }

    /// Parsed fields as `(title, value)` pairs, for column expansion on
    /// export. Fields without a value yield `Null`; non-object slots are
    /// skipped.
    pub fn field_value_pairs(&self) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .filter_map(|(name, slot)| match slot {
                FieldSlot::Parsed(field) => {
                    let value = field
                        .value
                        .as_ref()
                        .map(FieldValue::to_value)
                        .or_else(|| field.value_raw.clone())
                        .unwrap_or(Value::Null);
                    Some((name.clone(), value))
                }
                FieldSlot::Raw(_) => None,
            })
            .collect()
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.rest.clone();
        // Written fields win over an unrecognized shape carried in `rest`.
        if !self.fields.is_empty() || !object.contains_key("extra_fields") {
            let mut entries = Map::new();
            for (name, slot) in &self.fields {
                let value = match slot {
                    FieldSlot::Parsed(field) => field.to_value(),
                    FieldSlot::Raw(raw) => raw.clone(),
                };
                entries.insert(name.clone(), value);
            }
            object.insert("extra_fields".to_string(), Value::Object(entries));
        }
        Value::Object(object)
    }

    /// Serialize for a PATCH body. The remote contract requires metadata as
    /// a JSON string, not a nested object.
    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}
