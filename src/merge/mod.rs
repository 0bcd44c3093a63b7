//! Assembling the consolidated document.

pub mod merger;
pub mod metadata;
pub mod overlay;
pub mod pages;

pub use merger::{Assembly, Consolidation, Consolidator, consolidate};
pub use metadata::DocumentInfo;
pub use overlay::{FontFace, Overlay, Overlayer, PageGeometry, TextRun, page_text_runs};
pub use pages::OutputDocument;
