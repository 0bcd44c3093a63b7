//! The consolidation engine.
//!
//! Walks a [`Hierarchy`] in rendering order, appends every readable source
//! document behind a cover page and the reserved contents pages, and
//! records where each topic and sub-topic group starts. Once all pages are
//! in place the front matter, footers and outline are drawn from the same
//! entry list and the document is persisted.
//!
//! # Page numbers
//!
//! The cover is unnumbered: the page at physical index `i` is printed as
//! `i`. With `R` reserved contents pages the first content page is `R + 1`.

use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::{BinderError, Result};
use crate::hierarchy::Hierarchy;
use crate::io::{PdfWriter, SourceReader, WriteOptions};
use crate::merge::metadata::DocumentInfo;
use crate::merge::overlay::{PageGeometry, win_ansi_printable};
use crate::merge::pages::OutputDocument;
use crate::output::{EventSink, NullSink, RunEvent};
use crate::toc::{ContentsRenderer, OutlineWriter, TocEntry, write_toc_csv};

/// A finished, persisted consolidation.
#[derive(Debug, Clone)]
pub struct Consolidation {
    /// Path the document was written to.
    pub output: PathBuf,
    /// Physical page count, cover included.
    pub page_count: usize,
    /// Contents entries in emission order.
    pub entries: Vec<TocEntry>,
    /// Pages holding the table of contents.
    pub contents_pages: usize,
    /// Source documents merged.
    pub documents_merged: usize,
    /// Source documents that could not be opened.
    pub documents_skipped: usize,
    /// Size of the written file in bytes.
    pub file_size: u64,
    /// Path of the exported contents table, if one was requested.
    pub toc_csv: Option<PathBuf>,
}

/// A fully assembled document that has not been written yet.
#[derive(Debug)]
pub struct Assembly {
    /// The document, with front matter, footers and outline in place.
    pub document: Document,
    /// Contents entries in emission order.
    pub entries: Vec<TocEntry>,
    /// Pages holding the table of contents.
    pub contents_pages: usize,
    /// Source documents merged.
    pub documents_merged: usize,
    /// Source documents that could not be opened.
    pub documents_skipped: usize,
}

impl Assembly {
    /// Physical page count, cover included.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }
}

/// An entry together with the page object it must point at.
#[derive(Debug)]
struct PendingEntry {
    entry: TocEntry,
    first_page: ObjectId,
}

/// Merges hierarchies into consolidated documents.
pub struct Consolidator<'a> {
    config: &'a RunConfig,
    sink: &'a dyn EventSink,
    reader: SourceReader,
}

impl<'a> Consolidator<'a> {
    /// Create an engine for one run.
    pub fn new(config: &'a RunConfig, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            sink,
            reader: SourceReader::new(),
        }
    }

    /// Assemble the document for `hierarchy` and write it to `output`.
    ///
    /// Either the whole document is written or nothing replaces `output`.
    /// When [`RunConfig::toc_csv`] is set the entries are exported there
    /// after the document has been persisted.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::InvalidConfig`] for a layout that cannot be
    /// rendered, [`BinderError::ConsistencyViolation`] if the hierarchy
    /// holds an empty group or the page bookkeeping disagrees with the
    /// document, [`BinderError::Persist`] if the document cannot be written
    /// and [`BinderError::TocExport`] if the contents table cannot be.
    /// Source documents that cannot be opened are skipped, not reported as
    /// errors.
    pub fn consolidate(&self, hierarchy: &Hierarchy, output: &Path) -> Result<Consolidation> {
        let mut assembly = self.assemble(hierarchy)?;
        let page_count = assembly.page_count();

        let writer = PdfWriter::with_options(WriteOptions {
            compress: self.config.compress,
            ..WriteOptions::default()
        });
        let stats = writer.write(&mut assembly.document, output)?;

        self.sink.emit(RunEvent::DocumentPersisted {
            path: output.to_path_buf(),
            pages: page_count,
            bytes: stats.file_size,
        });

        if let Some(path) = &self.config.toc_csv {
            write_toc_csv(path, &assembly.entries)?;
            self.sink.emit(RunEvent::TocExported {
                path: path.clone(),
                entries: assembly.entries.len(),
            });
        }

        Ok(Consolidation {
            output: output.to_path_buf(),
            page_count,
            entries: assembly.entries,
            contents_pages: assembly.contents_pages,
            documents_merged: assembly.documents_merged,
            documents_skipped: assembly.documents_skipped,
            file_size: stats.file_size,
            toc_csv: self.config.toc_csv.clone(),
        })
    }

    /// Assemble the document for `hierarchy` in memory.
    pub fn assemble(&self, hierarchy: &Hierarchy) -> Result<Assembly> {
        self.config.validate()?;
        hierarchy.validate()?;

        let layout = &self.config.layout;
        let reserved = self.config.reserved_toc_pages;
        let renderer = ContentsRenderer::new(layout);

        let mut output = OutputDocument::new(layout.page_width, layout.page_height);
        for _ in 0..=reserved {
            output.push_blank()?;
        }

        let mut pending: Vec<PendingEntry> = Vec::new();
        let mut content_pages = 0_usize;
        let mut documents_merged = 0_usize;
        let mut documents_skipped = 0_usize;

        for topic in hierarchy.ordered(self.config.sort) {
            let mut topic_started = false;

            for group in &topic.groups {
                let mut group_started = false;

                for path in &group.documents {
                    let source = match self.reader.load(path) {
                        Ok(source) => source,
                        Err(err) if err.is_recoverable() => {
                            self.sink.emit(RunEvent::DocumentSkipped {
                                path: path.clone(),
                                reason: err.to_string(),
                            });
                            documents_skipped += 1;
                            continue;
                        }
                        Err(err) => return Err(err),
                    };

                    let first_number = output.page_count() as u32;
                    let page_ids = output.append_document(source)?;
                    let Some(&first_page) = page_ids.first() else {
                        continue;
                    };

                    if !topic_started {
                        pending.push(PendingEntry {
                            entry: TocEntry::new(1, self.printable(&topic.title), first_number),
                            first_page,
                        });
                        topic_started = true;
                    }
                    if !group_started && !group.sub_topics.is_empty() {
                        pending.push(PendingEntry {
                            entry: TocEntry::new(
                                2,
                                self.printable(&group.sub_topics.title()),
                                first_number,
                            ),
                            first_page,
                        });
                    }
                    group_started = true;

                    content_pages += page_ids.len();
                    documents_merged += 1;
                    self.sink.emit(RunEvent::DocumentMerged {
                        path: path.clone(),
                        pages: page_ids.len(),
                        first_page: first_number,
                    });
                }

                if !group_started {
                    self.sink.emit(RunEvent::GroupWithoutPages {
                        main_topic: topic.title.clone(),
                        sub_topics: group.sub_topics.title(),
                    });
                }
            }
        }

        let expected = 1 + reserved + content_pages;
        if output.page_count() != expected {
            return Err(BinderError::consistency(format!(
                "document has {} pages, expected {expected}",
                output.page_count()
            )));
        }

        let needed = renderer.pages_needed(pending.len());
        let contents_pages = reserved.max(needed);
        if needed > reserved {
            let extra = needed - reserved;
            output.insert_blank_pages(1 + reserved, extra)?;
            for pending in &mut pending {
                pending.entry.target_page += extra as u32;
            }
            self.sink.emit(RunEvent::ContentsExtended { reserved, needed });
        }

        verify_targets(&output, &pending)?;
        let entries: Vec<TocEntry> = pending.into_iter().map(|p| p.entry).collect();

        self.render(&mut output, &renderer, &entries, contents_pages)?;

        let mut document = output.into_document();
        OutlineWriter::new().write(&mut document, &entries)?;
        DocumentInfo::new(self.config.cover_title(), self.config.subject.clone())
            .apply(&mut document)?;

        Ok(Assembly {
            document,
            entries,
            contents_pages,
            documents_merged,
            documents_skipped,
        })
    }

    /// Contents title as the page fonts draw it. Outline and CSV use the
    /// same text so every contents representation agrees.
    fn printable(&self, title: &str) -> String {
        let printed = win_ansi_printable(title);
        if printed != title {
            self.sink.emit(RunEvent::TitleTranscoded {
                original: title.to_string(),
                printed: printed.clone(),
            });
        }
        printed
    }

    fn render(
        &self,
        output: &mut OutputDocument,
        renderer: &ContentsRenderer<'_>,
        entries: &[TocEntry],
        contents_pages: usize,
    ) -> Result<()> {
        let geometry = |output: &OutputDocument, index: usize| {
            output
                .page_id(index)
                .map(|id| PageGeometry::of(output.document(), id))
                .unwrap_or_default()
        };

        let cover = renderer.cover(
            &self.config.cover_title(),
            self.config.cover_subtitle.as_deref(),
            geometry(output, 0),
        );
        output.overlay(0, &cover)?;

        let pages = renderer.contents(entries, geometry(output, 1));
        for (offset, page) in pages.iter().enumerate() {
            output.overlay(1 + offset, page)?;
        }

        for index in (1 + contents_pages)..output.page_count() {
            let footer = renderer.footer(&index.to_string(), geometry(output, index));
            output.overlay(index, &footer)?;
        }

        Ok(())
    }
}

/// Check that every entry points at the page its group actually starts on.
fn verify_targets(output: &OutputDocument, pending: &[PendingEntry]) -> Result<()> {
    let mut previous = 0;
    for pending in pending {
        let entry = &pending.entry;
        if output.page_id(entry.target_page as usize) != Some(pending.first_page) {
            return Err(BinderError::consistency(format!(
                "entry '{}' targets page {}, which is not where its group starts",
                entry.title, entry.target_page
            )));
        }
        if entry.target_page < previous {
            return Err(BinderError::consistency(format!(
                "entry '{}' targets page {} before page {previous}",
                entry.title, entry.target_page
            )));
        }
        previous = entry.target_page;
    }
    Ok(())
}

/// Consolidate with the default configuration and no event reporting.
///
/// Returns the physical page count and the contents entries.
pub fn consolidate(hierarchy: &Hierarchy, output: &Path) -> Result<(usize, Vec<TocEntry>)> {
    let config = RunConfig::default();
    let consolidation = Consolidator::new(&config, &NullSink).consolidate(hierarchy, output)?;
    Ok((consolidation.page_count, consolidation.entries))
}
