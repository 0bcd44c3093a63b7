//! Integration tests for consolidation and read-back of both contents
//! representations.

use lopdf::Document;
use pdfbind::hierarchy::Hierarchy;
use pdfbind::merge::DocumentInfo;
use pdfbind::toc::{CONTENTS_CONTINUED, CONTENTS_HEADING, read_toc_csv};
use pdfbind::{
    Consolidator, Layout, RecordingSink, RunConfig, RunEvent, TocEntry, consolidate,
    read_contents, read_outline,
};
use rstest::rstest;
use tempfile::TempDir;

use crate::common::{fixture, key, texts, texts_at};

fn example_hierarchy(dir: &TempDir) -> Hierarchy {
    let a = fixture(dir.path(), "a.pdf", 2);
    let b = fixture(dir.path(), "b.pdf", 3);
    Hierarchy::from_groups([
        (key("Geometry", &["Shapes"]), vec![b]),
        (key("Algebra", &[]), vec![a]),
    ])
}

#[test]
fn test_example_layout() {
    let temp_dir = TempDir::new().unwrap();
    let hierarchy = example_hierarchy(&temp_dir);
    let output = temp_dir.path().join("book.pdf");

    let (pages, entries) = consolidate(&hierarchy, &output).unwrap();

    assert_eq!(pages, 9);
    assert_eq!(
        entries,
        vec![
            TocEntry::new(1, "Algebra", 4),
            TocEntry::new(1, "Geometry", 6),
            TocEntry::new(2, "Shapes", 6),
        ]
    );

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 9);
    assert_eq!(texts(&doc, 0), vec!["Grade 3 Math Worksheets"]);
    assert_eq!(texts(&doc, 1)[0], CONTENTS_HEADING);
    assert!(texts(&doc, 2).is_empty());
    assert!(texts(&doc, 3).is_empty());
    assert!(texts(&doc, 4).contains(&"a.pdf p1".to_string()));
    assert!(texts(&doc, 6).contains(&"b.pdf p1".to_string()));
    assert!(texts(&doc, 8).contains(&"b.pdf p3".to_string()));
}

#[test]
fn test_outline_and_contents_agree() {
    let temp_dir = TempDir::new().unwrap();
    let hierarchy = example_hierarchy(&temp_dir);
    let output = temp_dir.path().join("book.pdf");

    let (_, entries) = consolidate(&hierarchy, &output).unwrap();
    let doc = Document::load(&output).unwrap();

    assert_eq!(read_outline(&doc).unwrap(), entries);
    assert_eq!(read_contents(&doc, &Layout::default()).unwrap(), entries);
}

#[test]
fn test_footers_match_targets() {
    let temp_dir = TempDir::new().unwrap();
    let hierarchy = example_hierarchy(&temp_dir);
    let output = temp_dir.path().join("book.pdf");

    let (pages, entries) = consolidate(&hierarchy, &output).unwrap();
    let doc = Document::load(&output).unwrap();

    // Front matter is unnumbered.
    for index in 0..4 {
        assert!(texts_at(&doc, index, 303.0, 25.0).is_empty(), "page {index}");
    }
    for index in 4..pages {
        let label = index.to_string();
        assert_eq!(texts_at(&doc, index, 303.0, 25.0), vec![label], "page {index}");
    }
    for entry in &entries {
        let label = entry.target_page.to_string();
        assert_eq!(
            texts_at(&doc, entry.target_page as usize, 303.0, 25.0),
            vec![label]
        );
    }
}

#[test]
fn test_output_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let hierarchy = example_hierarchy(&temp_dir);
    let first = temp_dir.path().join("first.pdf");
    let second = temp_dir.path().join("second.pdf");

    consolidate(&hierarchy, &first).unwrap();
    consolidate(&hierarchy, &second).unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn test_unreadable_document_shifts_later_groups() {
    let temp_dir = TempDir::new().unwrap();
    let a = fixture(temp_dir.path(), "a.pdf", 2);
    let b = fixture(temp_dir.path(), "b.pdf", 3);
    let broken = temp_dir.path().join("broken.pdf");
    std::fs::write(&broken, b"this is not a pdf").unwrap();

    let hierarchy = Hierarchy::from_groups([
        (key("Algebra", &[]), vec![a]),
        (key("Fractions", &[]), vec![broken]),
        (key("Geometry", &["Shapes"]), vec![b]),
    ]);
    let output = temp_dir.path().join("book.pdf");

    let config = RunConfig::default();
    let sink = RecordingSink::new();
    let consolidation = Consolidator::new(&config, &sink)
        .consolidate(&hierarchy, &output)
        .unwrap();

    assert_eq!(consolidation.page_count, 9);
    assert_eq!(consolidation.documents_skipped, 1);
    assert_eq!(
        consolidation.entries,
        vec![
            TocEntry::new(1, "Algebra", 4),
            TocEntry::new(1, "Geometry", 6),
            TocEntry::new(2, "Shapes", 6),
        ]
    );
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::GroupWithoutPages { main_topic, .. } if main_topic == "Fractions")),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::DocumentPersisted { pages: 9, .. })),
        1
    );

    let doc = Document::load(&output).unwrap();
    assert_eq!(read_outline(&doc).unwrap(), consolidation.entries);
}

#[test]
fn test_non_latin_titles_agree_in_every_representation() {
    let temp_dir = TempDir::new().unwrap();
    let a = fixture(temp_dir.path(), "a.pdf", 1);
    let b = fixture(temp_dir.path(), "b.pdf", 1);
    let c = fixture(temp_dir.path(), "c.pdf", 1);

    let hierarchy = Hierarchy::from_groups([
        (key("Shapes \u{2605}", &[]), vec![a]),
        (key("\u{5206}\u{6570}", &[]), vec![b]),
        (key("\u{394} Angles", &[]), vec![c]),
    ]);
    let output = temp_dir.path().join("book.pdf");
    let csv = temp_dir.path().join("toc.csv");

    let config = RunConfig {
        toc_csv: Some(csv.clone()),
        ..RunConfig::default()
    };
    let sink = RecordingSink::new();
    let consolidation = Consolidator::new(&config, &sink)
        .consolidate(&hierarchy, &output)
        .unwrap();

    let titles: Vec<&str> = consolidation.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Shapes ?", "? Angles", "??"]);
    assert_eq!(
        sink.count(|e| matches!(e, RunEvent::TitleTranscoded { original, .. } if original == "\u{5206}\u{6570}")),
        1
    );

    let doc = Document::load(&output).unwrap();
    let outline = read_outline(&doc).unwrap();
    assert_eq!(outline, read_contents(&doc, &config.layout).unwrap());
    assert_eq!(outline, consolidation.entries);
    assert_eq!(read_toc_csv(&csv).unwrap(), consolidation.entries);
}

#[rstest]
#[case(1, 1, 1)]
#[case(16, 1, 1)]
#[case(40, 1, 3)]
#[case(40, 3, 3)]
#[case(60, 2, 4)]
fn test_contents_pages(#[case] topics: usize, #[case] reserved: usize, #[case] expected: usize) {
    let temp_dir = TempDir::new().unwrap();
    let doc = fixture(temp_dir.path(), "one.pdf", 1);

    // Each topic has one sub-topic group: two entries per topic.
    let hierarchy = Hierarchy::from_groups(
        (0..topics).map(|i| (key(&format!("Topic {i:02}"), &["Practice"]), vec![doc.clone()])),
    );
    let output = temp_dir.path().join("book.pdf");

    let config = RunConfig {
        reserved_toc_pages: reserved,
        ..RunConfig::default()
    };
    let consolidation = Consolidator::new(&config, &RecordingSink::new())
        .consolidate(&hierarchy, &output)
        .unwrap();

    assert_eq!(consolidation.contents_pages, expected);
    assert_eq!(consolidation.page_count, 1 + expected + topics);
    assert_eq!(consolidation.entries[0].target_page as usize, expected + 1);

    let pdf = Document::load(&output).unwrap();
    assert_eq!(read_contents(&pdf, &config.layout).unwrap(), consolidation.entries);
    assert_eq!(read_outline(&pdf).unwrap(), consolidation.entries);
    if expected > 1 {
        assert_eq!(texts(&pdf, 2)[0], CONTENTS_CONTINUED);
    }
}

#[test]
fn test_document_info() {
    let temp_dir = TempDir::new().unwrap();
    let hierarchy = example_hierarchy(&temp_dir);
    let output = temp_dir.path().join("book.pdf");

    let config = RunConfig {
        cover_title: Some("Arya's Worksheets".to_string()),
        cover_subtitle: Some("Spring term".to_string()),
        ..RunConfig::default()
    };
    Consolidator::new(&config, &RecordingSink::new())
        .consolidate(&hierarchy, &output)
        .unwrap();

    let doc = Document::load(&output).unwrap();
    let info = DocumentInfo::read(&doc);
    assert_eq!(info.title.as_deref(), Some("Arya's Worksheets"));
    assert_eq!(info.subject.as_deref(), Some("math"));
    assert_eq!(texts(&doc, 0), vec!["Arya's Worksheets", "Spring term"]);
}
