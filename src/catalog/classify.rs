//! Record classification.
//!
//! Decides whether a record belongs to the run's grade, splits its topic
//! path into a grouping key, and derives where its document lives locally.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::catalog::Record;
use crate::hierarchy::TopicKey;

/// Why a record was left out of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record's link appears on more than one record.
    DuplicateLink,
    /// The record has an empty topic path.
    NoTopics,
    /// The record is not tagged with the target grade.
    OtherGrade,
}

impl SkipReason {
    /// Short human-readable description.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateLink => "duplicate link",
            Self::NoTopics => "no topics",
            Self::OtherGrade => "not tagged with the target grade",
        }
    }
}

/// A record that qualified for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    /// Grouping key (main topic and sub-topic path).
    pub key: TopicKey,
    /// Canonical local path of the record's document.
    pub document: PathBuf,
    /// Full topic path, used for the header annotation.
    pub topics: Vec<String>,
    /// Grade labels, used for the header annotation.
    pub grades: Vec<String>,
    /// Link the document was (or would be) fetched from.
    pub source_ref: String,
}

/// Classifier bound to one target grade and one document directory.
#[derive(Debug, Clone)]
pub struct Classifier {
    target_grade: String,
    document_dir: PathBuf,
}

impl Classifier {
    /// Create a classifier.
    ///
    /// # Arguments
    ///
    /// * `target_grade` - Grade label records must carry (e.g. "GRADE 3")
    /// * `document_dir` - Directory canonical document paths are rooted in
    pub fn new(target_grade: impl Into<String>, document_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_grade: target_grade.into().trim().to_string(),
            document_dir: document_dir.into(),
        }
    }

    /// The grade label this classifier selects.
    pub fn target_grade(&self) -> &str {
        &self.target_grade
    }

    /// Classify a record, explaining why it was skipped.
    pub fn check(
        &self,
        record: &Record,
        duplicates: &BTreeSet<String>,
    ) -> Result<ClassifiedRecord, SkipReason> {
        if duplicates.contains(&record.source_ref) {
            return Err(SkipReason::DuplicateLink);
        }

        let Some((main_topic, sub_topics)) = record.topics.split_first() else {
            return Err(SkipReason::NoTopics);
        };

        if !record.has_grade(&self.target_grade) {
            return Err(SkipReason::OtherGrade);
        }

        Ok(ClassifiedRecord {
            key: TopicKey::new(main_topic.clone(), sub_topics.to_vec()),
            document: self.canonical_path(main_topic, &record.source_ref),
            topics: record.topics.clone(),
            grades: record.grades.clone(),
            source_ref: record.source_ref.clone(),
        })
    }

    /// Classify a record; `None` means it does not qualify.
    pub fn classify(
        &self,
        record: &Record,
        duplicates: &BTreeSet<String>,
    ) -> Option<ClassifiedRecord> {
        self.check(record, duplicates).ok()
    }

    /// Local path for a document, stable across runs.
    ///
    /// `<dir>/<GRADE>_<main topic>_<basename>`, e.g.
    /// `downloaded_pdfs/GRADE3_Geometry_shapes.pdf`.
    pub fn canonical_path(&self, main_topic: &str, source_ref: &str) -> PathBuf {
        let grade: String = self.target_grade.split_whitespace().collect();
        let name = format!(
            "{}_{}_{}",
            sanitize(&grade),
            sanitize(main_topic),
            sanitize(basename(source_ref))
        );
        self.document_dir.join(name)
    }

    /// Directory canonical paths are rooted in.
    pub fn document_dir(&self) -> &Path {
        &self.document_dir
    }
}

/// Last non-empty path segment of a link, without query or fragment.
fn basename(source_ref: &str) -> &str {
    let without_fragment = source_ref.split('#').next().unwrap_or(source_ref);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);

    without_query
        .rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("document.pdf")
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
