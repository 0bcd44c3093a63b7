//! Worksheet catalog: reading the metadata table and classifying records.

pub mod classify;
pub mod record;

pub use classify::{ClassifiedRecord, Classifier, SkipReason};
pub use record::{MetadataTable, Record, dedup_exact, duplicate_links};
