//! PDF input and output.

pub mod reader;
pub mod writer;

pub use reader::SourceReader;
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};
