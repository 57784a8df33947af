//! Models module for the SDK
//!
//! Defines the data structures shared by the import/export pipelines:
//! record kinds and the typed view of server-side extra-field metadata.

pub mod extra_field;
pub mod record;

pub use extra_field::{split_multi, ExtraField, FieldKind, FieldValue, Metadata};
pub use record::{RecordKind, EXPERIMENT_EXPORT_DROP, RESOURCE_EXPORT_DROP};
