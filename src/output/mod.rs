//! Run events and user-facing output.
//!
//! Library code never prints. Components report what happened through an
//! [`EventSink`] they are handed by the caller:
//!
//! - [`TracingSink`] forwards events to `tracing` (what the binary uses),
//! - [`NullSink`] drops them,
//! - [`RecordingSink`] keeps them in memory so callers can inspect a run.
//!
//! The end-of-run summary shown to the user goes through
//! [`OutputFormatter`].

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter, RunSummary};

use std::cell::RefCell;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::catalog::SkipReason;

/// Something noteworthy that happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A record did not qualify for the run.
    RecordSkipped {
        /// Link of the record.
        source_ref: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// The document of a qualifying record is not available locally.
    DocumentUnavailable {
        /// Canonical local path that was looked up.
        path: PathBuf,
        /// Link of the record.
        source_ref: String,
    },
    /// Header annotations were applied to a document.
    DocumentStamped {
        /// Stamped document.
        path: PathBuf,
    },
    /// A document already carries header annotations and was left alone.
    StampSkipped {
        /// Document that was already stamped.
        path: PathBuf,
    },
    /// Header annotations could not be applied; the record is skipped.
    StampFailed {
        /// Document that could not be stamped.
        path: PathBuf,
        /// Failure details.
        reason: String,
    },
    /// A source document was appended to the output.
    DocumentMerged {
        /// Source document.
        path: PathBuf,
        /// Pages contributed.
        pages: usize,
        /// Printed number of its first page in the output.
        first_page: u32,
    },
    /// A source document could not be opened and contributes no pages.
    DocumentSkipped {
        /// Source document.
        path: PathBuf,
        /// Failure details.
        reason: String,
    },
    /// No document of a group could be merged, so it has no contents entry.
    GroupWithoutPages {
        /// Main topic of the group.
        main_topic: String,
        /// Joined sub-topic path (empty for the main topic itself).
        sub_topics: String,
    },
    /// A contents title had characters the page fonts cannot draw; the
    /// printable form is used for every contents representation.
    TitleTranscoded {
        /// Title as classified.
        original: String,
        /// Title as drawn and bookmarked.
        printed: String,
    },
    /// More contents pages were needed than were reserved.
    ContentsExtended {
        /// Pages reserved up front.
        reserved: usize,
        /// Pages actually needed.
        needed: usize,
    },
    /// The output document was written.
    DocumentPersisted {
        /// Output path.
        path: PathBuf,
        /// Physical page count.
        pages: usize,
        /// Size of the written file.
        bytes: u64,
    },
    /// The contents table was exported.
    TocExported {
        /// Path of the CSV file.
        path: PathBuf,
        /// Number of rows written.
        entries: usize,
    },
}

/// Receiver of [`RunEvent`]s.
pub trait EventSink {
    /// Report one event.
    fn emit(&self, event: RunEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::RecordSkipped { source_ref, reason } => {
                debug!(source_ref = %source_ref, reason = reason.as_str(), "record skipped");
            }
            RunEvent::DocumentUnavailable { path, source_ref } => {
                warn!(path = %path.display(), source_ref = %source_ref, "document not available");
            }
            RunEvent::DocumentStamped { path } => {
                debug!(path = %path.display(), "stamped document");
            }
            RunEvent::StampSkipped { path } => {
                debug!(path = %path.display(), "document already stamped");
            }
            RunEvent::StampFailed { path, reason } => {
                warn!(path = %path.display(), reason = %reason, "stamping failed; skipping record");
            }
            RunEvent::DocumentMerged {
                path,
                pages,
                first_page,
            } => {
                debug!(path = %path.display(), pages, first_page, "merged document");
            }
            RunEvent::DocumentSkipped { path, reason } => {
                warn!(path = %path.display(), reason = %reason, "skipping unreadable document");
            }
            RunEvent::GroupWithoutPages {
                main_topic,
                sub_topics,
            } => {
                warn!(main_topic = %main_topic, sub_topics = %sub_topics, "group contributed no pages; no contents entry");
            }
            RunEvent::TitleTranscoded { original, printed } => {
                warn!(original = %original, printed = %printed, "title not representable in page fonts");
            }
            RunEvent::ContentsExtended { reserved, needed } => {
                info!(reserved, needed, "table of contents needs more pages than reserved");
            }
            RunEvent::DocumentPersisted { path, pages, bytes } => {
                info!(path = %path.display(), pages, bytes, "wrote consolidated document");
            }
            RunEvent::TocExported { path, entries } => {
                info!(path = %path.display(), entries, "exported table of contents");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RunEvent) {}
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<RunEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&RunEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        self.events.borrow_mut().push(event);
    }
}
