//! pdfbind binds classified worksheet PDFs into one document.
//!
//! A run reads the worksheet metadata table, keeps the records of one
//! grade, groups their documents by main topic and sub-topic, and merges
//! them behind a cover page and a table of contents. The contents pages,
//! the bookmarks and the page footers are all drawn from one list of
//! [`TocEntry`] values, so they always agree.
//!
//! ```no_run
//! use pdfbind::{Binder, LocalDocuments, MetadataTable, RunConfig, TracingSink};
//! use pdfbind::catalog::{dedup_exact, duplicate_links};
//! use std::path::Path;
//!
//! let config = RunConfig::default();
//! let records = dedup_exact(MetadataTable::read(Path::new("worksheets.csv"))?);
//! let duplicates = duplicate_links(&records);
//!
//! let report = Binder::new(&config, &TracingSink)
//!     .bind(&records, &duplicates, &LocalDocuments, &config.output_path())?;
//! println!("{} pages", report.consolidation.page_count);
//! # Ok::<(), pdfbind::BinderError>(())
//! ```

pub mod binder;
pub mod catalog;
pub mod cli;
pub mod config;
mod error;
pub mod hierarchy;
pub mod io;
pub mod merge;
pub mod output;
pub mod stamp;
pub mod toc;
pub(crate) mod utils;

#[cfg(test)]
mod test_support;

pub use binder::{Availability, BindReport, Binder, DocumentProvider, LocalDocuments};
pub use catalog::{Classifier, MetadataTable, Record};
pub use config::{Layout, RunConfig, SortPolicy};
pub use error::*;
pub use hierarchy::{Hierarchy, TopicKey, build_hierarchy};
pub use merge::{Consolidator, consolidate};
pub use output::{EventSink, NullSink, RecordingSink, RunEvent, TracingSink};
pub use toc::{TocEntry, read_contents, read_outline, write_toc_csv};

use tracing::info;

use crate::catalog::{dedup_exact, duplicate_links};
use crate::cli::Cli;
use crate::output::{OutputFormatter, RunSummary};

/// Run the whole pipeline for parsed command-line arguments.
///
/// Metadata table, classification, stamping, consolidation, optional
/// contents export, summary.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config()?;
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose > 0).with_json(cli.json);
    let sink = TracingSink;

    formatter.info(&format!("Reading {}...", cli.metadata.display()));
    let records = MetadataTable::read(&cli.metadata)?;
    let total = records.len();
    let records = dedup_exact(records);
    let duplicates = duplicate_links(&records);
    info!(
        records = total,
        unique = records.len(),
        duplicate_links = duplicates.len(),
        "read metadata table"
    );

    let output = config.output_path();
    formatter.info(&format!(
        "Binding {} worksheets into {}...",
        config.grade,
        output.display()
    ));
    let report = Binder::new(&config, &sink).bind(&records, &duplicates, &LocalDocuments, &output)?;
    let consolidation = report.consolidation;

    if consolidation.documents_skipped > 0 {
        formatter.warning(&format!(
            "{} document(s) could not be opened and were left out",
            consolidation.documents_skipped
        ));
    }
    if report.stamp_failures > 0 {
        formatter.warning(&format!(
            "{} document(s) could not be stamped; their records were skipped",
            report.stamp_failures
        ));
    }

    formatter.summary(&RunSummary {
        output: consolidation.output,
        pages: consolidation.page_count,
        file_size: consolidation.file_size,
        documents_merged: consolidation.documents_merged,
        documents_skipped: consolidation.documents_skipped,
        records_skipped: report.records_skipped,
        contents_pages: consolidation.contents_pages,
        entries: consolidation.entries,
        toc_csv: consolidation.toc_csv,
    });

    Ok(())
}
