//! Message formatting and the end-of-run summary.
//!
//! # Examples
//!
//! ```
//! use pdfbind::output::formatter::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Reading metadata table...");
//! formatter.success("Consolidation completed");
//! ```

use serde::Serialize;
use std::path::PathBuf;

use crate::toc::TocEntry;
use crate::utils::format_file_size;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Path of the consolidated document.
    pub output: PathBuf,
    /// Physical page count of the consolidated document.
    pub pages: usize,
    /// Size of the consolidated document in bytes.
    pub file_size: u64,
    /// Source documents merged.
    pub documents_merged: usize,
    /// Source documents that could not be opened.
    pub documents_skipped: usize,
    /// Records that did not qualify or had no usable document.
    pub records_skipped: usize,
    /// Pages used by the table of contents.
    pub contents_pages: usize,
    /// Contents entries in order.
    pub entries: Vec<TocEntry>,
    /// Path of the exported contents table, if any.
    pub toc_csv: Option<PathBuf>,
}

/// Output formatter with configurable verbosity.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether the summary is printed as JSON.
    json: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - Suppress non-error output
    /// * `verbose` - Show verbose output
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            json: false,
            colored: Self::should_use_color(),
        }
    }

    /// Print the summary as a JSON document instead of text.
    ///
    /// Text messages are suppressed so stdout stays machine-readable.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Detect if colored output should be used.
    ///
    /// Returns true if stdout is a TTY and TERM is set.
    fn should_use_color() -> bool {
        use std::io::IsTerminal;
        std::io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message.
    ///
    /// Suppressed in quiet and JSON mode.
    pub fn info(&self, message: &str) {
        if self.should_print() {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message.
    ///
    /// Suppressed in quiet and JSON mode.
    pub fn success(&self, message: &str) {
        if self.should_print() {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message.
    ///
    /// Always displayed, on stderr.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message.
    ///
    /// Always displayed, on stderr.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a debug/verbose message.
    pub fn debug(&self, message: &str) {
        if self.verbose && self.should_print() {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
            MessageLevel::Debug => ("→ ", "\x1b[36m"),   // Cyan
        };

        let line = if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        };

        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// Print the end-of-run summary.
    pub fn summary(&self, summary: &RunSummary) {
        if self.json {
            match serde_json::to_string_pretty(summary) {
                Ok(json) => println!("{json}"),
                Err(e) => self.error(&format!("Failed to serialize summary: {e}")),
            }
            return;
        }

        if self.quiet {
            return;
        }

        self.success(&format!(
            "Wrote {} ({} pages, {})",
            summary.output.display(),
            summary.pages,
            format_file_size(summary.file_size)
        ));
        self.info(&format!(
            "  {} document(s) merged, {} skipped, {} record(s) left out",
            summary.documents_merged, summary.documents_skipped, summary.records_skipped
        ));
        self.info(&format!(
            "  {} contents entries on {} page(s)",
            summary.entries.len(),
            summary.contents_pages
        ));

        for entry in &summary.entries {
            let indent = "  ".repeat(usize::from(entry.level));
            self.debug(&format!("{indent}{} .... {}", entry.title, entry.target_page));
        }

        if let Some(path) = &summary.toc_csv {
            self.info(&format!("  Contents table: {}", path.display()));
        }
    }

    fn should_print(&self) -> bool {
        !self.quiet && !self.json
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> RunSummary {
        RunSummary {
            output: PathBuf::from("grade3_math_consolidated.pdf"),
            pages: 9,
            file_size: 2048,
            documents_merged: 2,
            documents_skipped: 0,
            records_skipped: 1,
            contents_pages: 3,
            entries: vec![TocEntry::new(1, "Algebra", 4)],
            toc_csv: None,
        }
    }

    #[test]
    fn test_new_formatter() {
        let formatter = OutputFormatter::new(false, false);
        assert!(formatter.should_print());
    }

    #[test]
    fn test_quiet_formatter() {
        let formatter = OutputFormatter::new(true, false);
        assert!(!formatter.should_print());
        // Warnings and errors are still shown.
        formatter.warning("Important warning");
        formatter.error("Critical error");
    }

    #[test]
    fn test_json_suppresses_text() {
        let formatter = OutputFormatter::new(false, true).with_json(true);
        assert!(!formatter.should_print());
        formatter.info("not shown");
        formatter.summary(&sample_summary());
    }

    #[test]
    fn test_summary_serializes() {
        let json = serde_json::to_value(sample_summary()).unwrap();
        assert_eq!(json["pages"], 9);
        assert_eq!(json["entries"][0]["page_number"], 4);
        assert_eq!(json["entries"][0]["title"], "Algebra");
    }

    #[test]
    fn test_text_summary() {
        let formatter = OutputFormatter::new(false, true);
        formatter.summary(&sample_summary());
    }

    #[test]
    fn test_message_levels() {
        assert_eq!(MessageLevel::Info, MessageLevel::Info);
        assert_ne!(MessageLevel::Info, MessageLevel::Error);
    }
}
