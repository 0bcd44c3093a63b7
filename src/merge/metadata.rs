//! Document Info dictionary and PDF text strings.
//!
//! No dates are written: two runs over the same inputs must produce the
//! same bytes.

use lopdf::{Dictionary, Document, Object, StringFormat};

use crate::error::Result;

/// Producer and creator recorded in generated documents.
const PRODUCER: &str = concat!("pdfbind ", env!("CARGO_PKG_VERSION"));

/// Human-readable document properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Document title.
    pub title: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
}

impl DocumentInfo {
    /// Create document properties with a title and subject.
    pub fn new(title: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            subject: Some(subject.into()),
        }
    }

    /// Write the properties into a fresh Info dictionary.
    ///
    /// Any previous Info dictionary is replaced.
    pub fn apply(&self, doc: &mut Document) -> Result<()> {
        let mut info = Dictionary::new();

        if let Some(title) = &self.title {
            info.set("Title", text_string(title));
        }
        if let Some(subject) = &self.subject {
            info.set("Subject", text_string(subject));
        }
        info.set("Creator", text_string(PRODUCER));
        info.set("Producer", text_string(PRODUCER));

        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));
        Ok(())
    }

    /// Read the properties of a document.
    pub fn read(doc: &Document) -> Self {
        let info = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|object| doc.dereference(object).ok())
            .and_then(|(_, object)| object.as_dict().ok());

        let field = |key: &[u8]| {
            info.and_then(|dict| dict.get(key).ok())
                .and_then(|object| object.as_str().ok())
                .map(decode_text_string)
        };

        Self {
            title: field(b"Title"),
            subject: field(b"Subject"),
        }
    }
}

/// Encode a PDF text string.
///
/// ASCII text is stored as a literal string; anything else as UTF-16BE with
/// a byte order mark, which every viewer understands.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string written by [`text_string`] or any other producer.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
