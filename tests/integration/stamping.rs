//! Integration tests for the at-most-once stamping policy.

use lopdf::Document;
use pdfbind::catalog::{ClassifiedRecord, Record};
use pdfbind::stamp::is_stamped_file;
use pdfbind::{Availability, Binder, DocumentProvider, LocalDocuments, RecordingSink, RunConfig, RunEvent};
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

use crate::common::{texts_at, write_pdf};

/// Topic header baseline on a 792pt page.
const TOPICS_Y: f32 = 777.0;

/// Provider that reports every existing document as freshly downloaded.
struct AlwaysFresh;

impl DocumentProvider for AlwaysFresh {
    fn provide(&self, record: &ClassifiedRecord) -> Option<Availability> {
        record.document.is_file().then_some(Availability::Fresh)
    }
}

fn config(dir: &Path) -> RunConfig {
    RunConfig {
        document_dir: dir.to_path_buf(),
        ..RunConfig::default()
    }
}

fn topic_headers(path: &Path) -> Vec<usize> {
    let doc = Document::load(path).unwrap();
    (0..doc.get_pages().len())
        .map(|index| texts_at(&doc, index, 10.0, TOPICS_Y).len())
        .collect()
}

#[test]
fn test_repeated_runs_stamp_once() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let records = vec![Record::from_cells(
        "GRADE 3",
        "Math",
        "Geometry, Shapes",
        "https://example.com/ws/shapes.pdf",
    )];

    let path = Binder::new(&config, &RecordingSink::new())
        .classifier()
        .canonical_path("Geometry", "https://example.com/ws/shapes.pdf");
    write_pdf(&path, &["one", "two"]);

    for _ in 0..3 {
        let sink = RecordingSink::new();
        Binder::new(&config, &sink).collect(&records, &BTreeSet::new(), &LocalDocuments);
    }

    assert!(is_stamped_file(&path));
    assert_eq!(topic_headers(&path), vec![1, 1]);
    let doc = Document::load(&path).unwrap();
    assert_eq!(texts_at(&doc, 0, 10.0, TOPICS_Y), vec!["Geometry, Shapes"]);
}

#[test]
fn test_duplicate_path_in_one_run_is_stamped_once() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(temp_dir.path());
    let records = vec![
        Record::from_cells("GRADE 3", "Math", "Algebra", "https://a.example/sheet.pdf"),
        Record::from_cells("GRADE 3", "Math", "Algebra, Patterns", "https://b.example/sheet.pdf"),
    ];

    let sink = RecordingSink::new();
    let binder = Binder::new(&config, &sink);
    let path = binder
        .classifier()
        .canonical_path("Algebra", "https://a.example/sheet.pdf");
    write_pdf(&path, &["only"]);

    let collected = binder.collect(&records, &BTreeSet::new(), &AlwaysFresh);

    assert_eq!(collected.hierarchy.total_documents(), 2);
    assert_eq!(topic_headers(&path), vec![1]);
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::DocumentStamped { .. })),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::StampSkipped { .. })),
        1
    );
}

#[test]
fn test_stamped_documents_merge_with_one_header_layer() {
    let temp_dir = TempDir::new().unwrap();
    let docs = temp_dir.path().join("docs");
    let config = RunConfig {
        document_dir: docs.clone(),
        reserved_toc_pages: 1,
        ..RunConfig::default()
    };
    let records = vec![Record::from_cells(
        "GRADE 3",
        "Math",
        "Counting",
        "https://example.com/count.pdf",
    )];

    let sink = RecordingSink::new();
    let binder = Binder::new(&config, &sink);
    let path = binder
        .classifier()
        .canonical_path("Counting", "https://example.com/count.pdf");
    write_pdf(&path, &["count"]);

    let output = temp_dir.path().join("book.pdf");
    let report = binder
        .bind(&records, &BTreeSet::new(), &LocalDocuments, &output)
        .unwrap();
    assert_eq!(report.documents_stamped, 1);
    assert_eq!(report.consolidation.page_count, 3);

    // A second run over the same files must not add another layer.
    let report = Binder::new(&config, &RecordingSink::new())
        .bind(&records, &BTreeSet::new(), &LocalDocuments, &output)
        .unwrap();
    assert_eq!(report.documents_stamped, 0);

    let doc = Document::load(&output).unwrap();
    assert_eq!(texts_at(&doc, 2, 10.0, TOPICS_Y), vec!["Counting"]);
    assert_eq!(texts_at(&doc, 2, 417.0, 742.0), vec!["GRADE 3"]);
    assert_eq!(texts_at(&doc, 2, 303.0, 25.0), vec!["2"]);
}
