//! In-memory PDF fixtures for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

/// A document with one page per label; each page shows its label.
///
/// All pages share one resource dictionary that names Helvetica `F1`.
pub fn build_pdf(labels: &[&str]) -> Document {
    build(labels, false)
}

/// Like [`build_pdf`], but resources and media box are inherited from the
/// page tree root instead of being set on each page.
pub fn build_pdf_inherited(labels: &[&str]) -> Document {
    build(labels, true)
}

/// Write [`build_pdf`] to `path`.
pub fn write_pdf(path: &Path, labels: &[&str]) {
    let mut doc = build_pdf(labels);
    doc.save(path).unwrap();
}

fn build(labels: &[&str], inherited: bool) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
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

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !inherited {
            page.set("Resources", resources_id);
            page.set(
                "MediaBox",
                vec![0.into(), 0.into(), 612.into(), 792.into()],
            );
        }
        kids.push(doc.add_object(page).into());
    }

    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => labels.len() as i64,
    };
    if inherited {
        pages.set("Resources", resources_id);
        pages.set(
            "MediaBox",
            vec![0.into(), 0.into(), 612.into(), 792.into()],
        );
    }
    doc.objects.insert(pages_id, pages.into());

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}
