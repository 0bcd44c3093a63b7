//! CLI argument parsing for pdfbind.
//!
//! This module defines the command-line interface structure using `clap`
//! and turns parsed arguments into a validated [`RunConfig`].
//!
//! # Examples
//!
//! ```no_run
//! use pdfbind::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! println!("Reading {}", cli.metadata.display());
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{RunConfig, SortPolicy};
use crate::error::{BinderError, Result};

/// Format of log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Bind classified worksheet PDFs into one document.
///
/// pdfbind reads the worksheet metadata table, selects the records of one
/// grade, and merges their PDFs by topic behind a cover page and a table of
/// contents. The output has bookmarks and numbered pages.
#[derive(Parser, Debug)]
#[command(name = "pdfbind")]
#[command(version)]
#[command(about = "Bind classified worksheet PDFs into one document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Metadata table (CSV without header: grades, subjects, topics, link)
    #[arg(value_name = "METADATA_CSV")]
    pub metadata: PathBuf,

    /// TOML configuration file
    ///
    /// Every field is optional. Command-line flags override the file.
    #[arg(short, long, value_name = "FILE", env = "PDFBIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Grade label records must carry (e.g. "GRADE 3")
    #[arg(short, long, value_name = "LABEL")]
    pub grade: Option<String>,

    /// Subject of the worksheets, used in titles and file names
    #[arg(long, value_name = "NAME")]
    pub subject: Option<String>,

    /// Directory holding the source PDFs
    #[arg(short, long, value_name = "DIR")]
    pub documents: Option<PathBuf>,

    /// Output PDF file path
    ///
    /// Defaults to `<grade>_<subject>_consolidated.pdf`.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also export the table of contents as CSV
    #[arg(long, value_name = "FILE")]
    pub toc_csv: Option<PathBuf>,

    /// Number of contents pages reserved after the cover
    ///
    /// More pages are inserted automatically if the contents do not fit.
    #[arg(long, value_name = "N")]
    pub reserved_pages: Option<usize>,

    /// Cover page title
    #[arg(long, value_name = "TEXT")]
    pub cover_title: Option<String>,

    /// Do not stamp topic and grade headers onto source PDFs
    #[arg(long)]
    pub no_stamp: bool,

    /// Sort topics ignoring case
    #[arg(long)]
    pub case_insensitive: bool,

    /// Write uncompressed content streams
    #[arg(long)]
    pub no_compress: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Convert CLI arguments into a validated [`RunConfig`].
    ///
    /// The configuration file (if any) is loaded first; flags given on the
    /// command line replace its values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file cannot be read or parsed
    /// - The resulting configuration fails validation
    /// - The output would overwrite the metadata table
    pub fn to_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(grade) = &self.grade {
            config.grade = grade.clone();
        }
        if let Some(subject) = &self.subject {
            config.subject = subject.clone();
        }
        if let Some(documents) = &self.documents {
            config.document_dir = documents.clone();
        }
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(toc_csv) = &self.toc_csv {
            config.toc_csv = Some(toc_csv.clone());
        }
        if let Some(reserved) = self.reserved_pages {
            config.reserved_toc_pages = reserved;
        }
        if let Some(title) = &self.cover_title {
            config.cover_title = Some(title.clone());
        }
        if self.no_stamp {
            config.stamping = false;
        }
        if self.case_insensitive {
            config.sort = SortPolicy::CaseInsensitive;
        }
        if self.no_compress {
            config.compress = false;
        }

        config.validate()?;

        let output = config.output_path();
        if output == self.metadata || config.toc_csv.as_ref() == Some(&self.metadata) {
            return Err(BinderError::invalid_config(format!(
                "Output would overwrite the metadata table: {}",
                self.metadata.display()
            )));
        }

        Ok(config)
    }

    /// Default log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "pdfbind=warn",
            (false, 0) => "pdfbind=info",
            (false, 1) => "pdfbind=debug",
            (false, _) => "pdfbind=trace",
        }
    }
}
