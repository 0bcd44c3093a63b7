//! Header annotations on source documents.
//!
//! Every page of a stamped document shows the record's joined topics near
//! the top-left corner and its joined grades near the top-right corner.
//! The stamped file replaces the original atomically.
//!
//! Stamping is not idempotent: stamping a document twice draws the text
//! twice. The stamper records [`STAMP_MARKER`] in the document catalog so
//! callers can tell a stamped document from a fresh one with
//! [`is_stamped`], but it never checks the marker itself.

use lopdf::{Document, Object};
use std::path::Path;

use crate::config::Layout;
use crate::error::{BinderError, Result};
use crate::io::{PdfWriter, WriteOptions};
use crate::merge::overlay::{FontFace, Overlay, Overlayer, PageGeometry};

/// Catalog key marking a document as stamped.
pub const STAMP_MARKER: &str = "PdfbindStamped";

/// Draws topic and grade headers on source documents.
#[derive(Debug, Clone)]
pub struct Stamper<'a> {
    layout: &'a Layout,
    writer: PdfWriter,
}

impl<'a> Stamper<'a> {
    /// Create a stamper using the header positions of `layout`.
    pub fn new(layout: &'a Layout, compress: bool) -> Self {
        // Source objects are kept as they are; only the overlay is added.
        let writer = PdfWriter::with_options(WriteOptions {
            compress,
            optimize: false,
            ..WriteOptions::default()
        });
        Self { layout, writer }
    }

    /// Stamp the document at `path` and replace it.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::StampFailed`] if the document cannot be
    /// opened, stamped or saved. The original file is left untouched in
    /// that case.
    pub fn stamp(&self, path: &Path, topics: &[String], grades: &[String]) -> Result<()> {
        let mut doc =
            Document::load(path).map_err(|e| BinderError::stamp_failed(path, e.to_string()))?;
        if doc.is_encrypted() {
            return Err(BinderError::stamp_failed(path, "document is encrypted"));
        }

        self.stamp_document(&mut doc, topics, grades)
            .and_then(|()| self.writer.write(&mut doc, path).map(|_| ()))
            .map_err(|e| BinderError::stamp_failed(path, e.to_string()))
    }

    /// Stamp every page of an in-memory document.
    pub fn stamp_document(&self, doc: &mut Document, topics: &[String], grades: &[String]) -> Result<()> {
        let layout = self.layout;
        let topics = topics.join(", ");
        let grades = grades.join(", ");
        let (topics_x, topics_top) = layout.stamp_topics_at;

        let mut overlayer = Overlayer::new();
        let page_ids: Vec<_> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(BinderError::other("document has no pages"));
        }

        for page_id in page_ids {
            let geometry = PageGeometry::of(doc, page_id);

            let mut overlay = Overlay::new();
            overlay
                .text(
                    FontFace::HelveticaBold,
                    layout.stamp_font_size,
                    geometry.x(topics_x),
                    geometry.y_from_top(topics_top),
                    &topics,
                )
                .text(
                    FontFace::HelveticaBold,
                    layout.stamp_font_size,
                    geometry.x(geometry.width - layout.stamp_grades_inset),
                    geometry.y_from_top(layout.stamp_grades_top),
                    &grades,
                );
            overlayer.apply(doc, page_id, &overlay)?;
        }

        doc.catalog_mut()?
            .set(STAMP_MARKER, Object::Boolean(true));
        Ok(())
    }
}

/// Check if a document carries the stamp marker.
pub fn is_stamped(doc: &Document) -> bool {
    doc.catalog()
        .ok()
        .and_then(|catalog| catalog.get(STAMP_MARKER.as_bytes()).ok())
        .and_then(|value| value.as_bool().ok())
        .unwrap_or(false)
}

/// Check if the document at `path` carries the stamp marker.
///
/// Unreadable documents count as not stamped.
pub fn is_stamped_file(path: &Path) -> bool {
    Document::load(path).map(|doc| is_stamped(&doc)).unwrap_or(false)
}
