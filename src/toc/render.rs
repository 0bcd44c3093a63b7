//! Rendering the front matter and page numbers.
//!
//! Contents lines look like
//!
//! ```text
//! [] []  Geometry ................ 6          * * *
//!            Shapes ................ 6         * * *
//! ```
//!
//! with one indent step per level below 1. The checkboxes and stars are
//! only drawn when [`Layout::decorations`] is set.

use lopdf::Document;

use super::TocEntry;
use crate::config::Layout;
use crate::error::Result;
use crate::merge::overlay::{FontFace, Overlay, PageGeometry, page_text_runs};

/// Heading of the first contents page.
pub const CONTENTS_HEADING: &str = "Table of Contents";

/// Heading of every following contents page.
pub const CONTENTS_CONTINUED: &str = "Table of Contents (Continued)";

/// Star glyph in ZapfDingbats.
const STAR: &str = "H";
const STAR_GRAY: f32 = 0.8;
const CHECKBOX_SIZE: f32 = 10.0;
const CHECKBOX_X: [f32; 2] = [20.0, 40.0];
const STAR_X: [f32; 3] = [480.0, 500.0, 520.0];

/// Lays out cover, contents and footer text for a [`Layout`].
#[derive(Debug, Clone, Copy)]
pub struct ContentsRenderer<'a> {
    layout: &'a Layout,
}

impl<'a> ContentsRenderer<'a> {
    /// Create a renderer for `layout`.
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Contents pages needed for `entries` lines. Always at least one.
    pub fn pages_needed(&self, entries: usize) -> usize {
        let per_page = self.layout.entries_per_page().max(1);
        entries.div_ceil(per_page).max(1)
    }

    /// Text of one contents line.
    pub fn entry_line(&self, entry: &TocEntry) -> String {
        format!("{}{}{}", entry.title, self.layout.leader, entry.target_page)
    }

    /// Cover page text.
    pub fn cover(&self, title: &str, subtitle: Option<&str>, geometry: PageGeometry) -> Overlay {
        let layout = self.layout;
        let mut overlay = Overlay::new();
        overlay.text(
            FontFace::Helvetica,
            layout.cover_font_size,
            geometry.x(layout.margin_left),
            geometry.y_from_top(layout.cover_top),
            title,
        );
        if let Some(subtitle) = subtitle {
            overlay.text(
                FontFace::Helvetica,
                layout.heading_font_size,
                geometry.x(layout.margin_left),
                geometry.y_from_top(layout.cover_top + layout.cover_font_size * 1.5),
                subtitle,
            );
        }
        overlay
    }

    /// One overlay per contents page, in order.
    ///
    /// Entries are split into pages of [`Layout::entries_per_page`] lines,
    /// so the result has exactly [`pages_needed`](Self::pages_needed)
    /// elements.
    pub fn contents(&self, entries: &[TocEntry], geometry: PageGeometry) -> Vec<Overlay> {
        let layout = self.layout;
        let per_page = layout.entries_per_page().max(1);

        let mut pages = Vec::with_capacity(self.pages_needed(entries.len()));
        for (index, chunk) in entries.chunks(per_page).enumerate() {
            let heading = if index == 0 { CONTENTS_HEADING } else { CONTENTS_CONTINUED };
            let mut page = self.heading(heading, geometry);

            for (slot, entry) in chunk.iter().enumerate() {
                let baseline = geometry.y_from_top(layout.entry_top(slot));
                let indent = layout.indent * f32::from(entry.level.saturating_sub(1));

                if layout.decorations {
                    decorate(&mut page, geometry, baseline, layout.entry_font_size);
                }
                page.text(
                    FontFace::Helvetica,
                    layout.entry_font_size,
                    geometry.x(layout.margin_left + indent),
                    baseline,
                    &self.entry_line(entry),
                );
            }
            pages.push(page);
        }

        if pages.is_empty() {
            pages.push(self.heading(CONTENTS_HEADING, geometry));
        }
        pages
    }

    /// Page number centered near the bottom edge.
    ///
    /// The width is estimated from a fixed average glyph width.
    pub fn footer(&self, label: &str, geometry: PageGeometry) -> Overlay {
        let layout = self.layout;
        let width = layout.footer_char_width * label.chars().count() as f32;

        let mut overlay = Overlay::new();
        overlay.text(
            FontFace::Helvetica,
            layout.footer_font_size,
            geometry.x((geometry.width - width) / 2.0),
            geometry.y_from_bottom(layout.footer_offset),
            label,
        );
        overlay
    }

    fn heading(&self, text: &str, geometry: PageGeometry) -> Overlay {
        let mut overlay = Overlay::new();
        overlay.text(
            FontFace::Helvetica,
            self.layout.heading_font_size,
            geometry.x(self.layout.margin_left),
            geometry.y_from_top(self.layout.heading_top),
            text,
        );
        overlay
    }
}

fn decorate(page: &mut Overlay, geometry: PageGeometry, baseline: f32, size: f32) {
    for x in CHECKBOX_X {
        page.rect(geometry.x(x), baseline - 1.0, CHECKBOX_SIZE, CHECKBOX_SIZE);
    }
    for x in STAR_X {
        page.gray_text(FontFace::ZapfDingbats, size, geometry.x(x), baseline, STAR, STAR_GRAY);
    }
}

/// Parse the contents pages of a finished document back into entries.
///
/// Contents pages are the pages after the cover that start with a contents
/// heading. Levels are recovered from the indentation of each line.
pub fn read_contents(doc: &Document, layout: &Layout) -> Result<Vec<TocEntry>> {
    let mut entries = Vec::new();

    for page_id in doc.get_pages().into_values().skip(1) {
        let runs = page_text_runs(doc, page_id)?;
        let is_contents = runs
            .first()
            .is_some_and(|run| run.text == CONTENTS_HEADING || run.text == CONTENTS_CONTINUED);
        if !is_contents {
            break;
        }

        let geometry = PageGeometry::of(doc, page_id);
        for run in runs {
            let Some((title, page)) = run.text.rsplit_once(layout.leader.as_str()) else {
                continue;
            };
            let Ok(target_page) = page.trim().parse::<u32>() else {
                continue;
            };

            let offset = run.x - geometry.x(layout.margin_left);
            let steps = if layout.indent > 0.0 {
                (offset / layout.indent).round().max(0.0)
            } else {
                0.0
            };
            entries.push(TocEntry::new(steps as u8 + 1, title, target_page));
        }
    }

    Ok(entries)
}
