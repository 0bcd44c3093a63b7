//! From metadata records to a consolidated document.
//!
//! The [`Binder`] classifies records, asks a [`DocumentProvider`] whether
//! each record's document is available, stamps documents that still need
//! their header, and files the rest into a [`Hierarchy`] for the
//! [`Consolidator`].
//!
//! # Stamping policy
//!
//! A document is stamped at most once:
//! - a freshly provided document is always stamped,
//! - a document that was already present is stamped only if it does not
//!   carry the stamp marker,
//! - a path settled earlier in the same run is reused as is: the
//!   provider is not asked for it again, so a stamped file is never
//!   replaced by a fresh unstamped copy.
//!
//! A document that cannot be stamped is left out of the run.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalog::{ClassifiedRecord, Classifier, Record};
use crate::config::RunConfig;
use crate::error::Result;
use crate::hierarchy::Hierarchy;
use crate::merge::{Consolidation, Consolidator};
use crate::output::{EventSink, RunEvent};
use crate::stamp::{Stamper, is_stamped_file};

/// How a record's document became available locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Produced for this run (e.g. just downloaded).
    Fresh,
    /// Already on disk from an earlier run.
    Present,
}

/// Makes the documents of classified records available locally.
///
/// This is where a downloader plugs in. Returning `None` means the
/// document cannot be provided and the record is skipped.
pub trait DocumentProvider {
    /// Report whether `record.document` is available, and how.
    fn provide(&self, record: &ClassifiedRecord) -> Option<Availability>;
}

/// Provider for documents that are already on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDocuments;

impl DocumentProvider for LocalDocuments {
    fn provide(&self, record: &ClassifiedRecord) -> Option<Availability> {
        record.document.is_file().then_some(Availability::Present)
    }
}

/// Records filed into a hierarchy.
#[derive(Debug, Clone)]
pub struct Collected {
    /// Hierarchy of the usable records.
    pub hierarchy: Hierarchy,
    /// Records that did not qualify or had no usable document.
    pub records_skipped: usize,
    /// Documents stamped during collection.
    pub documents_stamped: usize,
    /// Documents that could not be stamped.
    pub stamp_failures: usize,
}

/// Outcome of [`Binder::bind`].
#[derive(Debug, Clone)]
pub struct BindReport {
    /// The written document.
    pub consolidation: Consolidation,
    /// Records that did not qualify or had no usable document.
    pub records_skipped: usize,
    /// Documents stamped during the run.
    pub documents_stamped: usize,
    /// Documents that could not be stamped.
    pub stamp_failures: usize,
}

/// Outcome of the stamping policy for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StampOutcome {
    Stamped,
    AlreadyStamped,
    Failed,
}

/// Runs one consolidation from records to output.
pub struct Binder<'a> {
    config: &'a RunConfig,
    sink: &'a dyn EventSink,
    classifier: Classifier,
    stamper: Stamper<'a>,
}

impl<'a> Binder<'a> {
    /// Create a binder for one run.
    pub fn new(config: &'a RunConfig, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            sink,
            classifier: Classifier::new(config.grade.clone(), config.document_dir.clone()),
            stamper: Stamper::new(&config.layout, config.compress),
        }
    }

    /// The classifier used for records.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify, provide and stamp `records`, and file the usable ones.
    ///
    /// Records whose link is in `duplicates` are skipped.
    pub fn collect(
        &self,
        records: &[Record],
        duplicates: &BTreeSet<String>,
        provider: &dyn DocumentProvider,
    ) -> Collected {
        let mut hierarchy = Hierarchy::new();
        let mut settled: HashSet<PathBuf> = HashSet::new();
        let mut records_skipped = 0;
        let mut documents_stamped = 0;
        let mut stamp_failures = 0;

        for record in records {
            let classified = match self.classifier.check(record, duplicates) {
                Ok(classified) => classified,
                Err(reason) => {
                    self.sink.emit(RunEvent::RecordSkipped {
                        source_ref: record.source_ref.clone(),
                        reason,
                    });
                    records_skipped += 1;
                    continue;
                }
            };

            if settled.contains(&classified.document) {
                if self.config.stamping {
                    self.sink.emit(RunEvent::StampSkipped {
                        path: classified.document.clone(),
                    });
                }
                hierarchy.insert(classified.key, classified.document);
                continue;
            }

            let Some(availability) = provider.provide(&classified) else {
                self.sink.emit(RunEvent::DocumentUnavailable {
                    path: classified.document.clone(),
                    source_ref: classified.source_ref.clone(),
                });
                records_skipped += 1;
                continue;
            };

            if self.config.stamping {
                match self.ensure_stamped(&classified, availability) {
                    StampOutcome::Stamped => documents_stamped += 1,
                    StampOutcome::AlreadyStamped => {}
                    StampOutcome::Failed => {
                        stamp_failures += 1;
                        records_skipped += 1;
                        continue;
                    }
                }
            }

            settled.insert(classified.document.clone());
            hierarchy.insert(classified.key, classified.document);
        }

        Collected {
            hierarchy,
            records_skipped,
            documents_stamped,
            stamp_failures,
        }
    }

    /// Collect `records` and consolidate them into `output`.
    pub fn bind(
        &self,
        records: &[Record],
        duplicates: &BTreeSet<String>,
        provider: &dyn DocumentProvider,
        output: &Path,
    ) -> Result<BindReport> {
        let collected = self.collect(records, duplicates, provider);
        info!(
            main_topics = collected.hierarchy.main_topic_count(),
            documents = collected.hierarchy.total_documents(),
            records_skipped = collected.records_skipped,
            "filed records"
        );
        let consolidation =
            Consolidator::new(self.config, self.sink).consolidate(&collected.hierarchy, output)?;

        Ok(BindReport {
            consolidation,
            records_skipped: collected.records_skipped,
            documents_stamped: collected.documents_stamped,
            stamp_failures: collected.stamp_failures,
        })
    }

    /// Apply the stamping policy to a newly provided document.
    fn ensure_stamped(&self, record: &ClassifiedRecord, availability: Availability) -> StampOutcome {
        let path = &record.document;

        let needed = match availability {
            Availability::Fresh => true,
            Availability::Present => !is_stamped_file(path),
        };
        if !needed {
            self.sink.emit(RunEvent::StampSkipped { path: path.clone() });
            return StampOutcome::AlreadyStamped;
        }

        match self.stamper.stamp(path, &record.topics, &record.grades) {
            Ok(()) => {
                self.sink.emit(RunEvent::DocumentStamped { path: path.clone() });
                StampOutcome::Stamped
            }
            Err(err) => {
                self.sink.emit(RunEvent::StampFailed {
                    path: path.clone(),
                    reason: err.to_string(),
                });
                StampOutcome::Failed
            }
        }
    }
}
