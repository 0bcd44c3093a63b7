//! Drawing text and boxes on top of existing pages.
//!
//! # Coordinate System
//!
//! PDF user space has its origin at the **bottom-left** corner of the media
//! box. Layout positions in this crate are measured from the **top** edge,
//! the way a page is read, and are converted with
//!
//! ```text
//! pdf_y = y0 + height - top
//! ```
//!
//! # Overlay Strategy
//!
//! The existing page content is wrapped in a `q`/`Q` pair so graphics state
//! left behind by the original page cannot leak into the overlay, then the
//! overlay content stream is appended. Fonts are registered in the page's
//! own resource dictionary under a name that is not already taken.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, BTreeSet};

use super::pages::inherited_attribute;
use crate::error::Result;

/// US Letter, used when a page has no usable media box.
const DEFAULT_WIDTH: f32 = 612.0;
const DEFAULT_HEIGHT: f32 = 792.0;

/// WinAnsiEncoding code points 0x80..=0x9F that differ from Latin-1.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

/// Standard 14 fonts used for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontFace {
    /// Regular sans-serif text.
    Helvetica,
    /// Bold sans-serif text.
    HelveticaBold,
    /// Symbol font used for decorations.
    ZapfDingbats,
}

impl FontFace {
    fn base_font(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    fn dictionary(self) -> Dictionary {
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(self.base_font().as_bytes().to_vec()));
        // Symbolic fonts use their built-in encoding.
        if self != Self::ZapfDingbats {
            font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        }
        font
    }
}

/// Media box of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Left edge.
    pub x0: f32,
    /// Bottom edge.
    pub y0: f32,
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl PageGeometry {
    /// Geometry of a page, following inherited media boxes.
    pub fn of(doc: &Document, page_id: ObjectId) -> Self {
        inherited_attribute(doc, page_id, b"MediaBox")
            .and_then(|object| doc.dereference(object).ok())
            .and_then(|(_, object)| object.as_array().ok())
            .and_then(|values| {
                let values: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
                match values.as_slice() {
                    [llx, lly, urx, ury] if urx > llx && ury > lly => Some(Self {
                        x0: *llx,
                        y0: *lly,
                        width: urx - llx,
                        height: ury - lly,
                    }),
                    _ => None,
                }
            })
            .unwrap_or_default()
    }

    /// User-space x for a distance from the left edge.
    pub fn x(&self, left: f32) -> f32 {
        self.x0 + left
    }

    /// User-space y for a distance from the top edge.
    pub fn y_from_top(&self, top: f32) -> f32 {
        self.y0 + self.height - top
    }

    /// User-space y for a distance from the bottom edge.
    pub fn y_from_bottom(&self, bottom: f32) -> f32 {
        self.y0 + bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Text {
        face: FontFace,
        size: f32,
        x: f32,
        y: f32,
        text: Vec<u8>,
        gray: Option<f32>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Marks to draw on one page, in user-space coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    marks: Vec<Mark>,
}

impl Overlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a line of text with its baseline starting at `(x, y)`.
    pub fn text(&mut self, face: FontFace, size: f32, x: f32, y: f32, text: &str) -> &mut Self {
        self.marks.push(Mark::Text {
            face,
            size,
            x,
            y,
            text: encode_win_ansi(text),
            gray: None,
        });
        self
    }

    /// Draw a line of text filled with a gray level (0 black, 1 white).
    pub fn gray_text(
        &mut self,
        face: FontFace,
        size: f32,
        x: f32,
        y: f32,
        text: &str,
        gray: f32,
    ) -> &mut Self {
        self.marks.push(Mark::Text {
            face,
            size,
            x,
            y,
            text: encode_win_ansi(text),
            gray: Some(gray),
        });
        self
    }

    /// Stroke a rectangle whose lower-left corner is `(x, y)`.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.marks.push(Mark::Rect {
            x,
            y,
            width,
            height,
        });
        self
    }

    /// `true` if nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    fn faces(&self) -> BTreeSet<FontFace> {
        self.marks
            .iter()
            .filter_map(|mark| match mark {
                Mark::Text { face, .. } => Some(*face),
                Mark::Rect { .. } => None,
            })
            .collect()
    }

    fn operations(&self, names: &BTreeMap<FontFace, Vec<u8>>) -> Vec<Operation> {
        let mut operations = Vec::new();

        for mark in &self.marks {
            match mark {
                Mark::Text {
                    face,
                    size,
                    x,
                    y,
                    text,
                    gray,
                } => {
                    let name = names.get(face).cloned().unwrap_or_default();
                    if let Some(level) = gray {
                        operations.push(Operation::new("q", vec![]));
                        operations.push(Operation::new("g", vec![Object::Real(*level)]));
                    }
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![Object::Name(name), Object::Real(*size)],
                    ));
                    operations.push(Operation::new(
                        "Td",
                        vec![Object::Real(*x), Object::Real(*y)],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(text.clone(), StringFormat::Literal)],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                    if gray.is_some() {
                        operations.push(Operation::new("Q", vec![]));
                    }
                }
                Mark::Rect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    operations.push(Operation::new(
                        "re",
                        vec![
                            Object::Real(*x),
                            Object::Real(*y),
                            Object::Real(*width),
                            Object::Real(*height),
                        ],
                    ));
                    operations.push(Operation::new("S", vec![]));
                }
            }
        }

        operations
    }
}

/// Applies [`Overlay`]s to the pages of one document.
///
/// Font objects and the `q`/`Q` streams are created once and shared by
/// every page, so an `Overlayer` must only be used with the document it
/// first touched.
#[derive(Debug, Default)]
pub struct Overlayer {
    fonts: BTreeMap<FontFace, ObjectId>,
    state_streams: Option<(ObjectId, ObjectId)>,
}

impl Overlayer {
    /// Create an overlayer with no shared objects yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `overlay` on top of the page's existing content.
    pub fn apply(&mut self, doc: &mut Document, page_id: ObjectId, overlay: &Overlay) -> Result<()> {
        if overlay.is_empty() {
            return Ok(());
        }

        let mut names = BTreeMap::new();
        for face in overlay.faces() {
            let name = self.ensure_font(doc, page_id, face)?;
            names.insert(face, name);
        }

        let bytes = Content {
            operations: overlay.operations(&names),
        }
        .encode()?;
        let stream_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

        self.append_contents(doc, page_id, stream_id)
    }

    fn font_id(&mut self, doc: &mut Document, face: FontFace) -> ObjectId {
        *self
            .fonts
            .entry(face)
            .or_insert_with(|| doc.add_object(face.dictionary()))
    }

    /// Register `face` in the page's font resources and return its name.
    ///
    /// Inherited or shared resource dictionaries are copied onto the page
    /// first, so other pages never see the added font.
    fn ensure_font(&mut self, doc: &mut Document, page_id: ObjectId, face: FontFace) -> Result<Vec<u8>> {
        let font_id = self.font_id(doc, face);

        let mut resources = match inherited_attribute(doc, page_id, b"Resources") {
            Some(object) => resolve_dictionary(doc, object)?,
            None => Dictionary::new(),
        };
        let mut fonts = match resources.get(b"Font") {
            Ok(object) => resolve_dictionary(doc, object)?,
            Err(_) => Dictionary::new(),
        };

        let existing = fonts
            .iter()
            .find(|(_, value)| matches!(value, Object::Reference(id) if *id == font_id))
            .map(|(name, _)| name.clone());

        let name = match existing {
            Some(name) => name,
            None => {
                let name = (1..)
                    .map(|n| format!("PbF{n}").into_bytes())
                    .find(|candidate| !fonts.has(candidate))
                    .unwrap_or_else(|| b"PbF".to_vec());
                fonts.set(name.clone(), Object::Reference(font_id));
                name
            }
        };

        resources.set("Font", Object::Dictionary(fonts));
        doc.get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    fn append_contents(&mut self, doc: &mut Document, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
        let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
            Err(_) => Vec::new(),
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(other) => vec![other.clone()],
        };

        let contents = if existing.is_empty() {
            vec![Object::Reference(stream_id)]
        } else {
            let (save, restore) = self.state_streams(doc);
            let mut contents = Vec::with_capacity(existing.len() + 3);
            contents.push(Object::Reference(save));
            contents.extend(existing);
            contents.push(Object::Reference(restore));
            contents.push(Object::Reference(stream_id));
            contents
        };

        doc.get_dictionary_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    fn state_streams(&mut self, doc: &mut Document) -> (ObjectId, ObjectId) {
        *self.state_streams.get_or_insert_with(|| {
            // Streams are concatenated verbatim, so keep operators apart.
            let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            (save, restore)
        })
    }
}

fn resolve_dictionary(doc: &Document, object: &Object) -> Result<Dictionary> {
    let (_, object) = doc.dereference(object)?;
    Ok(object.as_dict()?.clone())
}

/// A run of text shown on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// User-space x of the run's start.
    pub x: f32,
    /// User-space y of the run's baseline.
    pub y: f32,
    /// Decoded text.
    pub text: String,
}

/// Text runs shown on a page, in content order.
///
/// Positions are tracked through `Td`, `TD` and `Tm` only; this is enough
/// for text drawn by [`Overlay`], not a general text extractor.
pub fn page_text_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<TextRun>> {
    let bytes = doc.get_page_content(page_id)?;
    let content = Content::decode(&bytes)?;

    let mut runs = Vec::new();
    let (mut x, mut y) = (0.0_f32, 0.0_f32);

    for operation in &content.operations {
        let operands: Vec<f32> = operation
            .operands
            .iter()
            .filter_map(|o| o.as_float().ok())
            .collect();

        match operation.operator.as_str() {
            "BT" => (x, y) = (0.0, 0.0),
            "Td" | "TD" => {
                if let [dx, dy] = operands.as_slice() {
                    x += dx;
                    y += dy;
                }
            }
            "Tm" => {
                if let [_, _, _, _, e, f] = operands.as_slice() {
                    (x, y) = (*e, *f);
                }
            }
            "Tj" | "'" | "\"" => {
                if let Some(Object::String(bytes, _)) = operation.operands.last() {
                    runs.push(TextRun {
                        x,
                        y,
                        text: decode_win_ansi(bytes),
                    });
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operation.operands.first() {
                    let bytes: Vec<u8> = items
                        .iter()
                        .filter_map(|item| match item {
                            Object::String(bytes, _) => Some(bytes.as_slice()),
                            _ => None,
                        })
                        .flatten()
                        .copied()
                        .collect();
                    runs.push(TextRun {
                        x,
                        y,
                        text: decode_win_ansi(&bytes),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

/// Encode text for a WinAnsiEncoding font; unsupported characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            _ => WIN_ANSI_HIGH
                .iter()
                .find(|(_, mapped)| *mapped == c)
                .map(|(code, _)| *code)
                .unwrap_or(b'?'),
        })
        .collect()
}

/// The form `text` takes once drawn with a WinAnsiEncoding font.
///
/// Equal to `text` exactly when every character is representable.
pub fn win_ansi_printable(text: &str) -> String {
    decode_win_ansi(&encode_win_ansi(text))
}

/// Decode WinAnsiEncoding bytes.
pub fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => WIN_ANSI_HIGH
                .iter()
                .find(|(code, _)| *code == b)
                .map(|(_, c)| *c)
                .unwrap_or('?'),
            _ => char::from(b),
        })
        .collect()
}
