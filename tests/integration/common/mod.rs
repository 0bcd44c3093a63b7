//! Shared helpers for the integration tests.
//!
//! Source PDFs are generated on the fly; every page shows a single label
//! at (72, 720) so tests can tell pages apart after merging.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use std::path::{Path, PathBuf};

use pdfbind::hierarchy::TopicKey;
use pdfbind::merge::page_text_runs;

/// Write a PDF with one page per label.
pub fn write_pdf(path: &Path, labels: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => labels.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    doc.save(path).unwrap();
}

/// Write `<dir>/<name>` with `pages` pages labelled `"<name> p<n>"`.
pub fn fixture(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    let labels: Vec<String> = (1..=pages).map(|n| format!("{name} p{n}")).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    write_pdf(&path, &labels);
    path
}

/// Grouping key from string slices.
pub fn key(main: &str, subs: &[&str]) -> TopicKey {
    TopicKey::new(main, subs.iter().map(|s| s.to_string()).collect())
}

/// Page object at a 0-based physical index.
pub fn page_at(doc: &Document, index: usize) -> ObjectId {
    doc.get_pages()[&(index as u32 + 1)]
}

/// Texts shown on the page at a 0-based physical index.
pub fn texts(doc: &Document, index: usize) -> Vec<String> {
    page_text_runs(doc, page_at(doc, index))
        .unwrap()
        .into_iter()
        .map(|run| run.text)
        .collect()
}

/// Text shown at exactly `(x, y)` on the page at a 0-based physical index.
pub fn texts_at(doc: &Document, index: usize, x: f32, y: f32) -> Vec<String> {
    page_text_runs(doc, page_at(doc, index))
        .unwrap()
        .into_iter()
        .filter(|run| run.x == x && run.y == y)
        .map(|run| run.text)
        .collect()
}
