//! Loading source documents.
//!
//! Every source document goes through [`SourceReader::load`], which turns
//! the different ways a file can be unusable (missing, not a PDF,
//! encrypted, no pages) into distinct recoverable errors.

use lopdf::Document;
use std::path::Path;

use crate::error::{BinderError, Result};

/// Reader for source documents.
#[derive(Debug, Clone, Default)]
pub struct SourceReader;

impl SourceReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single source document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or is not a valid PDF ([`BinderError::DocumentOpen`])
    /// - The PDF is encrypted ([`BinderError::EncryptedPdf`])
    /// - The PDF has no pages ([`BinderError::EmptyDocument`])
    pub fn load(&self, path: &Path) -> Result<Document> {
        let document = Document::load(path).map_err(|e| {
            let reason = e.to_string();
            let lowered = reason.to_lowercase();
            if lowered.contains("encrypt") || lowered.contains("password") {
                BinderError::EncryptedPdf {
                    path: path.to_path_buf(),
                }
            } else {
                BinderError::document_open(path, reason)
            }
        })?;

        if document.is_encrypted() {
            return Err(BinderError::EncryptedPdf {
                path: path.to_path_buf(),
            });
        }

        if document.get_pages().is_empty() {
            return Err(BinderError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        Ok(document)
    }
}
