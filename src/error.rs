//! Error types for pdfbind.
//!
//! Errors fall into three groups:
//!
//! - **Per-document failures** (a source PDF cannot be opened or stamped).
//!   These are recoverable: the document is skipped and the run continues.
//! - **Structural failures** (the topic hierarchy or the table of contents
//!   disagrees with the pages actually written). These abort the run.
//! - **Persistence failures** (the output cannot be written). These abort
//!   the run and never leave a half-written file in place of a good one.

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfbind operations.
pub type Result<T> = std::result::Result<T, BinderError>;

/// Main error type for pdfbind operations.
#[derive(Debug, thiserror::Error)]
pub enum BinderError {
    /// The metadata table could not be read or parsed.
    #[error("Failed to read metadata table: {}\n  Reason: {source}", path.display())]
    MetadataRead {
        /// Path to the metadata table.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A source document could not be opened.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    DocumentOpen {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// A source document is encrypted.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// A source document opened fine but has no pages.
    #[error("PDF has no pages: {}", path.display())]
    EmptyDocument {
        /// Path to the empty PDF.
        path: PathBuf,
    },

    /// Header annotations could not be applied to a source document.
    #[error("Failed to stamp PDF: {}\n  Reason: {reason}", path.display())]
    StampFailed {
        /// Path to the PDF being stamped.
        path: PathBuf,
        /// Details about the failure.
        reason: String,
    },

    /// The hierarchy, the page offsets and the table of contents disagree.
    #[error("Consistency violation: {reason}")]
    ConsistencyViolation {
        /// What disagreed.
        reason: String,
    },

    /// The finished document could not be persisted.
    #[error("Failed to write output file: {}\n  Reason: {source}", path.display())]
    Persist {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The TOC table could not be exported.
    #[error("Failed to export table of contents: {}\n  Reason: {source}", path.display())]
    TocExport {
        /// Path of the TOC table.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// PDF object model error raised while building the output.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for BinderError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BinderError>() {
            Ok(err) => err,
            Err(err) => Self::other(format!("{err:#}")),
        }
    }
}

impl BinderError {
    /// Create a DocumentOpen error.
    pub fn document_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DocumentOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a StampFailed error.
    pub fn stamp_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StampFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a ConsistencyViolation error.
    pub fn consistency(reason: impl Into<String>) -> Self {
        Self::ConsistencyViolation {
            reason: reason.into(),
        }
    }

    /// Create a Persist error.
    pub fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single document.
    ///
    /// Recoverable errors are logged and the document is skipped; the
    /// remaining documents are still merged.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DocumentOpen { .. }
                | Self::EncryptedPdf { .. }
                | Self::EmptyDocument { .. }
                | Self::StampFailed { .. }
        )
    }

    /// Check if this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConsistencyViolation { .. } | Self::Persist { .. } | Self::MetadataRead { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MetadataRead { .. } => 2,
            Self::DocumentOpen { .. } => 3,
            Self::EncryptedPdf { .. } => 3,
            Self::EmptyDocument { .. } => 3,
            Self::StampFailed { .. } => 3,
            Self::ConsistencyViolation { .. } => 6,
            Self::Persist { .. } => 5,
            Self::TocExport { .. } => 5,
            Self::InvalidConfig { .. } => 1,
            Self::Io(_) => 5,
            Self::Pdf(_) => 6,
            Self::Other { .. } => 1,
        }
    }
}
