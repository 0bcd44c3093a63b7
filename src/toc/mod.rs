//! Table of contents: entries, the rendered contents pages and the native
//! outline.
//!
//! Both representations are produced from the same `&[TocEntry]`, and both
//! can be read back from a finished document ([`read_contents`],
//! [`read_outline`]) to check that they agree.

pub mod outline;
pub mod render;

pub use outline::{OutlineWriter, read_outline};
pub use render::{CONTENTS_CONTINUED, CONTENTS_HEADING, ContentsRenderer, read_contents};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BinderError, Result};
use crate::utils::temp_path_for;

/// One line of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// 1 for a main topic, 2 for a sub-topic group.
    pub level: u8,
    /// Main topic title or joined sub-topic path.
    pub title: String,
    /// Printed number of the group's first page.
    #[serde(rename = "page_number")]
    pub target_page: u32,
}

impl TocEntry {
    /// Create an entry.
    pub fn new(level: u8, title: impl Into<String>, target_page: u32) -> Self {
        Self {
            level,
            title: title.into(),
            target_page,
        }
    }
}

/// Export entries as CSV with the header `level,title,page_number`.
///
/// The file is written next to its destination and renamed into place.
pub fn write_toc_csv(path: &Path, entries: &[TocEntry]) -> Result<()> {
    let export_error = |source: csv::Error| BinderError::TocExport {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| export_error(e.into()))?;
    }

    let temp_path = temp_path_for(path);
    let result = write_entries(&temp_path, entries)
        .and_then(|()| std::fs::rename(&temp_path, path).map_err(csv::Error::from));

    if let Err(source) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(export_error(source));
    }

    Ok(())
}

fn write_entries(path: &Path, entries: &[TocEntry]) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    // serde only emits the header together with the first row.
    if entries.is_empty() {
        writer.write_record(["level", "title", "page_number"])?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read entries exported by [`write_toc_csv`].
pub fn read_toc_csv(path: &Path) -> Result<Vec<TocEntry>> {
    let export_error = |source: csv::Error| BinderError::TocExport {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(export_error)?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<TocEntry>, csv::Error>>()
        .map_err(export_error)
}
