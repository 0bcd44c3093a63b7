//! End-to-end runs from a metadata table to the consolidated document.

use clap::Parser;
use lopdf::Document;
use pdfbind::cli::Cli;
use pdfbind::toc::read_toc_csv;
use pdfbind::{BinderError, Classifier, TocEntry, read_outline};
use std::path::Path;
use tempfile::TempDir;

use crate::common::{texts, write_pdf};

const TABLE: &str = "\
\"GRADE 2, GRADE 3\",Math,\"Geometry, Shapes\",https://example.com/ws/shapes.pdf
GRADE 3,Math,Algebra,https://example.com/ws/patterns.pdf?ref=list
GRADE 3,Math,Algebra,https://example.com/ws/patterns.pdf?ref=list
GRADE 4,Math,Fractions,https://example.com/ws/halves.pdf
GRADE 3,Math,Measurement,https://example.com/ws/dup.pdf
GRADE 3,Math,Time,https://example.com/ws/dup.pdf
GRADE 3,Math,Money,https://example.com/ws/coins.pdf
,,,
";

fn prepare(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let docs = dir.join("docs");
    let classifier = Classifier::new("GRADE 3", &docs);
    write_pdf(
        &classifier.canonical_path("Geometry", "https://example.com/ws/shapes.pdf"),
        &["shapes 1", "shapes 2", "shapes 3"],
    );
    write_pdf(
        &classifier.canonical_path("Algebra", "https://example.com/ws/patterns.pdf?ref=list"),
        &["patterns 1", "patterns 2"],
    );
    // Money's document was never downloaded.

    let table = dir.join("worksheets.csv");
    std::fs::write(&table, TABLE).unwrap();
    (table, docs)
}

#[test]
fn test_full_run() {
    let temp_dir = TempDir::new().unwrap();
    let (table, docs) = prepare(temp_dir.path());
    let output = temp_dir.path().join("out/grade3.pdf");
    let toc = temp_dir.path().join("out/toc.csv");

    let cli = Cli::parse_from([
        "pdfbind",
        table.to_str().unwrap(),
        "--documents",
        docs.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--toc-csv",
        toc.to_str().unwrap(),
        "--quiet",
    ]);
    pdfbind::run(&cli).unwrap();

    let expected = vec![
        TocEntry::new(1, "Algebra", 4),
        TocEntry::new(1, "Geometry", 6),
        TocEntry::new(2, "Shapes", 6),
    ];

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 9);
    assert_eq!(read_outline(&doc).unwrap(), expected);
    assert_eq!(read_toc_csv(&toc).unwrap(), expected);
    assert!(texts(&doc, 4).contains(&"patterns 1".to_string()));
    assert!(texts(&doc, 4).contains(&"Algebra".to_string()));
}

#[test]
fn test_run_without_stamping_leaves_sources_alone() {
    let temp_dir = TempDir::new().unwrap();
    let (table, docs) = prepare(temp_dir.path());
    let source = Classifier::new("GRADE 3", &docs)
        .canonical_path("Geometry", "https://example.com/ws/shapes.pdf");
    let before = std::fs::read(&source).unwrap();

    let output = temp_dir.path().join("book.pdf");
    let cli = Cli::parse_from([
        "pdfbind",
        table.to_str().unwrap(),
        "--documents",
        docs.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--no-stamp",
        "--json",
    ]);
    pdfbind::run(&cli).unwrap();

    assert_eq!(std::fs::read(&source).unwrap(), before);
    let doc = Document::load(&output).unwrap();
    assert!(!texts(&doc, 4).contains(&"Algebra".to_string()));
}

#[test]
fn test_missing_metadata_table() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.csv");
    let output = temp_dir.path().join("book.pdf");

    let cli = Cli::parse_from([
        "pdfbind",
        missing.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-q",
    ]);
    let err = pdfbind::run(&cli).unwrap_err();

    assert!(matches!(err, BinderError::MetadataRead { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!output.exists());
}
