//! Worksheet records and the metadata table they are read from.
//!
//! The table has no header row and four columns:
//!
//! ```text
//! grades,subjects,topics,pdf_link
//! "GRADE 2, GRADE 3",Math,"Addition, Word Problems",https://example.com/ws/add-1.pdf
//! ```
//!
//! Multi-valued cells are comma separated inside the quoted field.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

use crate::error::{BinderError, Result};

/// One worksheet as listed in the metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Grade labels the worksheet is tagged with (e.g. "GRADE 3").
    pub grades: Vec<String>,
    /// Subjects the worksheet is tagged with.
    pub subjects: Vec<String>,
    /// Topic path: main topic first, then sub-topics in order.
    pub topics: Vec<String>,
    /// Link or path of the worksheet PDF.
    pub source_ref: String,
}

impl Record {
    /// Create a record from its four raw cells.
    pub fn from_cells(grades: &str, subjects: &str, topics: &str, source_ref: &str) -> Self {
        Self {
            grades: split_cell(grades),
            subjects: split_cell(subjects),
            topics: split_cell(topics),
            source_ref: source_ref.trim().to_string(),
        }
    }

    /// Check whether the record is tagged with `grade`.
    pub fn has_grade(&self, grade: &str) -> bool {
        let grade = grade.trim();
        self.grades.iter().any(|g| g == grade)
    }
}

/// Split a multi-valued cell on commas, trimming and dropping empty pieces.
fn split_cell(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reader for the header-less metadata table.
pub struct MetadataTable;

impl MetadataTable {
    /// Read all records from a metadata table file.
    ///
    /// Empty rows and rows with fewer than four columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::MetadataRead`] if the file cannot be opened or
    /// is not valid CSV.
    pub fn read(path: &Path) -> Result<Vec<Record>> {
        let file = std::fs::File::open(path).map_err(|e| BinderError::MetadataRead {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;

        Self::from_reader(file).map_err(|source| BinderError::MetadataRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read all records from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Vec<Record>, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            if row.len() < 4 || row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let grades = row[0].trim_start_matches('\u{feff}');
            records.push(Record::from_cells(grades, &row[1], &row[2], &row[3]));
        }

        Ok(records)
    }
}

/// Drop exact duplicate records, keeping the first occurrence.
pub fn dedup_exact(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect()
}

/// Links that appear on more than one record.
///
/// Such links carry conflicting classifications, so every record with one
/// of them is left out of the hierarchy.
pub fn duplicate_links(records: &[Record]) -> BTreeSet<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.source_ref.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(link, _)| link.to_string())
        .collect()
}
