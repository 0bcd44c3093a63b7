//! Native outline (bookmarks).
//!
//! Level-1 entries become top-level outline items; each level-2 entry is a
//! child of the closest level-1 entry before it. Every item jumps to the
//! physical page whose printed number is the entry's `target_page`.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashSet};

use super::TocEntry;
use crate::error::{BinderError, Result};
use crate::merge::metadata::{decode_text_string, text_string};

/// Writer for the document outline.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineWriter;

struct OutlineNode {
    id: ObjectId,
    entry_index: usize,
    children: Vec<OutlineNode>,
}

impl OutlineWriter {
    /// Create a new outline writer.
    pub fn new() -> Self {
        Self
    }

    /// Replace the document outline with one item per entry.
    ///
    /// # Errors
    ///
    /// Returns [`BinderError::ConsistencyViolation`] if an entry targets a
    /// page that does not exist, has a level other than 1 or 2, or is a
    /// level-2 entry without a preceding level-1 entry.
    pub fn write(&self, doc: &mut Document, entries: &[TocEntry]) -> Result<()> {
        let pages = doc.get_pages();

        let mut roots: Vec<OutlineNode> = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            let node = OutlineNode {
                id: doc.new_object_id(),
                entry_index: index,
                children: Vec::new(),
            };
            match entry.level {
                1 => roots.push(node),
                2 => match roots.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => {
                        return Err(BinderError::consistency(format!(
                            "sub-topic entry '{}' has no main topic",
                            entry.title
                        )));
                    }
                },
                level => {
                    return Err(BinderError::consistency(format!(
                        "entry '{}' has unsupported level {level}",
                        entry.title
                    )));
                }
            }
        }

        let outline_id = doc.new_object_id();
        let mut items = Vec::with_capacity(entries.len());
        link_siblings(&roots, outline_id, entries, &pages, &mut items)?;
        for (id, item) in items {
            doc.objects.insert(id, Object::Dictionary(item));
        }

        let mut outline = Dictionary::new();
        outline.set("Type", Object::Name(b"Outlines".to_vec()));
        outline.set("Count", Object::Integer(entries.len() as i64));
        if let (Some(first), Some(last)) = (roots.first(), roots.last()) {
            outline.set("First", Object::Reference(first.id));
            outline.set("Last", Object::Reference(last.id));
        }
        doc.objects.insert(outline_id, Object::Dictionary(outline));

        let catalog = doc.catalog_mut()?;
        catalog.set("Outlines", Object::Reference(outline_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));

        Ok(())
    }
}

fn link_siblings(
    nodes: &[OutlineNode],
    parent: ObjectId,
    entries: &[TocEntry],
    pages: &BTreeMap<u32, ObjectId>,
    items: &mut Vec<(ObjectId, Dictionary)>,
) -> Result<()> {
    for (position, node) in nodes.iter().enumerate() {
        let entry = &entries[node.entry_index];
        let page_id = pages.get(&(entry.target_page + 1)).ok_or_else(|| {
            BinderError::consistency(format!(
                "outline entry '{}' targets page {} of a {}-page document",
                entry.title,
                entry.target_page,
                pages.len()
            ))
        })?;

        let mut item = Dictionary::new();
        item.set("Title", text_string(&entry.title));
        item.set("Parent", Object::Reference(parent));
        item.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(*page_id),
                Object::Name(b"XYZ".to_vec()),
                Object::Null,
                Object::Null,
                Object::Null,
            ]),
        );
        if position > 0 {
            item.set("Prev", Object::Reference(nodes[position - 1].id));
        }
        if let Some(next) = nodes.get(position + 1) {
            item.set("Next", Object::Reference(next.id));
        }
        if let (Some(first), Some(last)) = (node.children.first(), node.children.last()) {
            item.set("First", Object::Reference(first.id));
            item.set("Last", Object::Reference(last.id));
            // Positive: the item starts expanded.
            item.set("Count", Object::Integer(node.children.len() as i64));
        }
        items.push((node.id, item));

        link_siblings(&node.children, node.id, entries, pages, items)?;
    }
    Ok(())
}

/// Read the outline of a document as entries, in display order.
///
/// Items nested deeper than two levels are reported with their depth.
/// Items whose destination cannot be resolved to a page are skipped.
pub fn read_outline(doc: &Document) -> Result<Vec<TocEntry>> {
    let page_numbers: BTreeMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number.saturating_sub(1)))
        .collect();

    let catalog = doc.catalog()?;
    let Ok(outline) = catalog.get(b"Outlines") else {
        return Ok(Vec::new());
    };
    let (_, outline) = doc.dereference(outline)?;
    let outline = outline.as_dict()?;

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    if let Ok(first) = outline.get(b"First").and_then(Object::as_reference) {
        read_siblings(doc, first, 1, &page_numbers, &mut visited, &mut entries)?;
    }
    Ok(entries)
}

fn read_siblings(
    doc: &Document,
    first: ObjectId,
    level: u8,
    page_numbers: &BTreeMap<ObjectId, u32>,
    visited: &mut HashSet<ObjectId>,
    entries: &mut Vec<TocEntry>,
) -> Result<()> {
    let mut current = Some(first);

    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(BinderError::consistency("outline items form a cycle"));
        }
        let item = doc.get_dictionary(id)?;

        let title = item
            .get(b"Title")
            .and_then(Object::as_str)
            .map(decode_text_string)
            .unwrap_or_default();
        if let Some(page) = destination_page(doc, item).and_then(|p| page_numbers.get(&p)) {
            entries.push(TocEntry::new(level, title, *page));
        }

        if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
            read_siblings(doc, child, level.saturating_add(1), page_numbers, visited, entries)?;
        }

        current = item.get(b"Next").and_then(Object::as_reference).ok();
    }

    Ok(())
}

/// Page targeted by an item's `Dest` or `GoTo` action.
fn destination_page(doc: &Document, item: &Dictionary) -> Option<ObjectId> {
    let dest = match item.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => {
            let action = item.get(b"A").ok()?;
            let (_, action) = doc.dereference(action).ok()?;
            action.as_dict().ok()?.get(b"D").ok()?
        }
    };
    let (_, dest) = doc.dereference(dest).ok()?;
    dest.as_array().ok()?.first()?.as_reference().ok()
}
