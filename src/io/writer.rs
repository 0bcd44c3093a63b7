//! Persisting documents.
//!
//! Writes are atomic by default: the document is serialized into a sibling
//! temporary file which is then renamed over the destination. A failed
//! write leaves the previous file (if any) untouched and removes the
//! temporary file.

use lopdf::Document;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{BinderError, Result};
use crate::utils::temp_path_for;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Compress content streams before writing.
    pub compress: bool,

    /// Drop unreachable objects and renumber the rest.
    pub optimize: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            optimize: true,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Size of the written file in bytes.
    pub file_size: u64,
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Save a document and return statistics about the operation.
    ///
    /// The document is finalized in place (pruned, renumbered, compressed
    /// according to the options) before it is serialized.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::Persist`] if the parent directory cannot be
    /// created, the file cannot be written, or the final rename fails.
    pub fn write(&self, doc: &mut Document, path: &Path) -> Result<WriteStatistics> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| BinderError::persist(parent, e))?;
        }

        if self.options.optimize {
            doc.prune_objects();
            doc.renumber_objects();
        }

        if self.options.compress {
            doc.compress();
        }

        let write_path = if self.options.atomic {
            temp_path_for(path)
        } else {
            path.to_path_buf()
        };

        if let Err(err) = self.write_to(doc, &write_path) {
            if self.options.atomic {
                let _ = std::fs::remove_file(&write_path);
            }
            return Err(err);
        }

        if self.options.atomic
            && let Err(e) = std::fs::rename(&write_path, path)
        {
            let _ = std::fs::remove_file(&write_path);
            return Err(BinderError::persist(path, e));
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        Ok(WriteStatistics { file_size })
    }

    fn write_to(&self, doc: &mut Document, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| BinderError::persist(path, e))?;
        let mut writer = BufWriter::with_capacity(self.options.buffer_size, file);

        doc.save_to(&mut writer)
            .map_err(|e| BinderError::persist(path, std::io::Error::other(e)))?;

        writer.flush().map_err(|e| BinderError::persist(path, e))?;

        Ok(())
    }
}
