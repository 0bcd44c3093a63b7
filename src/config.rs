//! Run configuration for pdfbind.
//!
//! Every component receives its settings from an explicit [`RunConfig`]
//! instead of reading process-wide state. A configuration is assembled in
//! three steps:
//! - defaults,
//! - an optional TOML file (every field may be omitted),
//! - command-line overrides,
//!
//! and is then checked with [`RunConfig::validate`].

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::BinderError;

/// Ordering applied to main topics and sub-topic groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortPolicy {
    /// Plain byte-wise string order ("Zebra" sorts before "apple").
    #[default]
    CaseSensitive,
    /// Lower-cased comparison; ties fall back to byte-wise order.
    CaseInsensitive,
}

impl SortPolicy {
    /// Compare two titles under this policy.
    ///
    /// The result is a total order for both policies.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::CaseSensitive => a.cmp(b),
            Self::CaseInsensitive => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }
}

impl FromStr for SortPolicy {
    type Err = crate::BinderError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "case-sensitive" => Ok(Self::CaseSensitive),
            "case-insensitive" => Ok(Self::CaseInsensitive),
            _ => Err(BinderError::invalid_config(format!(
                "Invalid sort policy: {s}. Must be one of: case-sensitive, case-insensitive"
            ))),
        }
    }
}

/// Geometry and typography of the generated pages.
///
/// Vertical positions are measured from the top edge of the page, the way
/// the pages are read; they are flipped into PDF user space when drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Width of generated pages in points.
    pub page_width: f32,
    /// Height of generated pages in points.
    pub page_height: f32,

    /// Left margin of cover and contents text.
    pub margin_left: f32,
    /// Baseline of the cover title.
    pub cover_top: f32,
    /// Cover title size.
    pub cover_font_size: f32,

    /// Baseline of the contents heading.
    pub heading_top: f32,
    /// Contents heading size.
    pub heading_font_size: f32,
    /// Baseline of the first contents entry.
    pub entries_top: f32,
    /// Distance between two contents entries.
    pub line_height: f32,
    /// Space kept free under the last contents entry.
    pub bottom_margin: f32,
    /// Horizontal indent per outline level.
    pub indent: f32,
    /// Contents entry size.
    pub entry_font_size: f32,
    /// Dot fill between an entry title and its page number.
    pub leader: String,
    /// Draw checkboxes and rating stars beside each entry.
    pub decorations: bool,

    /// Footer baseline, measured from the bottom edge.
    pub footer_offset: f32,
    /// Footer number size.
    pub footer_font_size: f32,
    /// Estimated average glyph width used to center footer numbers.
    pub footer_char_width: f32,

    /// Header annotation size.
    pub stamp_font_size: f32,
    /// Position of the joined topics.
    pub stamp_topics_at: (f32, f32),
    /// Distance of the joined grades from the right edge.
    pub stamp_grades_inset: f32,
    /// Baseline of the joined grades.
    pub stamp_grades_top: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin_left: 72.0,
            cover_top: 72.0,
            cover_font_size: 24.0,
            heading_top: 72.0,
            heading_font_size: 18.0,
            entries_top: 110.0,
            line_height: 20.0,
            bottom_margin: 40.0,
            indent: 20.0,
            entry_font_size: 12.0,
            leader: " ................ ".to_string(),
            decorations: true,
            footer_offset: 25.0,
            footer_font_size: 12.0,
            footer_char_width: 6.0,
            stamp_font_size: 12.0,
            stamp_topics_at: (10.0, 15.0),
            stamp_grades_inset: 195.0,
            stamp_grades_top: 50.0,
        }
    }
}

impl Layout {
    /// Number of contents entries that fit on one contents page.
    ///
    /// Entry `n` of a page sits at `entries_top + n * line_height` and must
    /// keep one more line of room above the bottom margin. Returns 0 for a
    /// non-positive or non-finite line height.
    pub fn entries_per_page(&self) -> usize {
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return 0;
        }
        let room = self.page_height - self.bottom_margin - self.entries_top;
        if !room.is_finite() || room < self.line_height {
            return 0;
        }
        (room / self.line_height).floor() as usize
    }

    /// Top offset of the `slot`-th entry on a contents page.
    pub fn entry_top(&self, slot: usize) -> f32 {
        self.entries_top + slot as f32 * self.line_height
    }
}

/// Complete configuration for one consolidation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Grade label a record must carry to be included (e.g. "GRADE 3").
    pub grade: String,

    /// Subject the worksheets belong to, used for titles and file names.
    pub subject: String,

    /// Directory holding the locally available source documents.
    pub document_dir: PathBuf,

    /// Output PDF path. Derived from grade and subject when unset.
    pub output: Option<PathBuf>,

    /// Optional CSV export of the table of contents.
    pub toc_csv: Option<PathBuf>,

    /// Cover title. Derived from grade and subject when unset.
    pub cover_title: Option<String>,

    /// Optional second cover line.
    pub cover_subtitle: Option<String>,

    /// Number of blank contents pages reserved after the cover.
    pub reserved_toc_pages: usize,

    /// Ordering of topics and sub-topics.
    pub sort: SortPolicy,

    /// Stamp topic/grade headers onto source documents.
    pub stamping: bool,

    /// Compress content streams of written documents.
    pub compress: bool,

    /// Page geometry and typography.
    pub layout: Layout,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grade: "GRADE 3".to_string(),
            subject: "math".to_string(),
            document_dir: PathBuf::from("downloaded_pdfs"),
            output: None,
            toc_csv: None,
            cover_title: None,
            cover_subtitle: None,
            reserved_toc_pages: 3,
            sort: SortPolicy::CaseSensitive,
            stamping: true,
            compress: true,
            layout: Layout::default(),
        }
    }
}

impl RunConfig {
    /// Load a configuration from a TOML file.
    ///
    /// Fields missing from the file keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    /// Output path, falling back to `<grade>_<subject>_consolidated.pdf`.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}_{}_consolidated.pdf",
                compact(&self.grade).to_lowercase(),
                compact(&self.subject).to_lowercase()
            ))
        })
    }

    /// Cover title, falling back to `<Grade> <Subject> Worksheets`.
    pub fn cover_title(&self) -> String {
        self.cover_title.clone().unwrap_or_else(|| {
            format!(
                "{} {} Worksheets",
                title_case(&self.grade),
                title_case(&self.subject)
            )
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The grade label is empty
    /// - No contents pages are reserved
    /// - A page dimension or font size is not positive
    /// - Not a single contents entry fits on a page
    pub fn validate(&self) -> Result<()> {
        if self.grade.trim().is_empty() {
            bail!(BinderError::invalid_config("Grade label cannot be empty"));
        }

        if self.reserved_toc_pages == 0 {
            bail!(BinderError::invalid_config(
                "At least one contents page must be reserved"
            ));
        }

        let layout = &self.layout;
        let sizes = [
            ("page_width", layout.page_width),
            ("page_height", layout.page_height),
            ("line_height", layout.line_height),
            ("cover_font_size", layout.cover_font_size),
            ("heading_font_size", layout.heading_font_size),
            ("entry_font_size", layout.entry_font_size),
            ("footer_font_size", layout.footer_font_size),
            ("stamp_font_size", layout.stamp_font_size),
        ];
        for (name, value) in sizes {
            if value.is_nan() || value <= 0.0 {
                bail!(BinderError::invalid_config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if layout.entries_per_page() == 0 {
            bail!(BinderError::invalid_config(
                "Layout leaves no room for contents entries"
            ));
        }

        Ok(())
    }
}

fn compact(label: &str) -> String {
    label.split_whitespace().collect()
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_policy_from_str() {
        assert_eq!(
            SortPolicy::from_str("case-sensitive").unwrap(),
            SortPolicy::CaseSensitive
        );
        assert_eq!(
            SortPolicy::from_str("CASE-INSENSITIVE").unwrap(),
            SortPolicy::CaseInsensitive
        );
        assert!(SortPolicy::from_str("natural").is_err());
    }

    #[test]
    fn test_sort_policy_compare() {
        assert_eq!(
            SortPolicy::CaseSensitive.compare("Zebra", "apple"),
            Ordering::Less
        );
        assert_eq!(
            SortPolicy::CaseInsensitive.compare("Zebra", "apple"),
            Ordering::Greater
        );
        // Ties are broken byte-wise so the order stays total.
        assert_eq!(
            SortPolicy::CaseInsensitive.compare("Shapes", "shapes"),
            Ordering::Less
        );
    }

    #[test]
    fn test_entries_per_page_default_layout() {
        // 110, 130, ... 730 all keep 20pt of room above the 752pt limit.
        assert_eq!(Layout::default().entries_per_page(), 32);
    }

    #[test]
    fn test_entries_per_page_degenerate_line_height() {
        for line_height in [0.0, -20.0, f32::NAN, f32::INFINITY] {
            let layout = Layout {
                line_height,
                ..Layout::default()
            };
            assert_eq!(layout.entries_per_page(), 0, "line height {line_height}");
        }
    }

    #[test]
    fn test_entries_per_page_exact_fit() {
        // 110 + 31 * 20 = 730 leaves exactly one line above 750.
        let layout = Layout {
            page_height: 790.0,
            ..Layout::default()
        };
        assert_eq!(layout.entries_per_page(), 32);
        assert_eq!(layout.entry_top(31), 730.0);
    }

    #[test]
    fn test_derived_names() {
        let config = RunConfig::default();
        assert_eq!(
            config.output_path(),
            PathBuf::from("grade3_math_consolidated.pdf")
        );
        assert_eq!(config.cover_title(), "Grade 3 Math Worksheets");

        let config = RunConfig {
            output: Some(PathBuf::from("out.pdf")),
            cover_title: Some("Arya's Worksheets".to_string()),
            ..RunConfig::default()
        };
        assert_eq!(config.output_path(), PathBuf::from("out.pdf"));
        assert_eq!(config.cover_title(), "Arya's Worksheets");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RunConfig::from_toml_str(
            r#"
            grade = "GRADE 4"
            reserved_toc_pages = 5
            sort = "case-insensitive"

            [layout]
            decorations = false
            "#,
        )
        .unwrap();

        assert_eq!(config.grade, "GRADE 4");
        assert_eq!(config.reserved_toc_pages, 5);
        assert_eq!(config.sort, SortPolicy::CaseInsensitive);
        assert!(!config.layout.decorations);
        assert_eq!(config.layout.page_height, 792.0);
        assert!(config.stamping);
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        assert!(RunConfig::from_toml_str("reserved_toc_pages = \"three\"").is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = RunConfig::default();
        assert!(config.validate().is_ok());

        config.grade = "  ".to_string();
        assert!(config.validate().is_err());
        config.grade = "GRADE 3".to_string();

        config.reserved_toc_pages = 0;
        assert!(config.validate().is_err());
        config.reserved_toc_pages = 3;

        config.layout.page_height = 0.0;
        assert!(config.validate().is_err());
        config.layout.page_height = 792.0;

        config.layout.entries_top = 780.0;
        assert!(config.validate().is_err());
    }
}
