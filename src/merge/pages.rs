//! The output document's page tree.
//!
//! [`OutputDocument`] owns the document being assembled and keeps a single
//! flat `Kids` array in page order. Source documents are appended by
//! renumbering their objects above the current maximum id, copying every
//! object except their catalog and page tree nodes, and re-parenting their
//! pages under the output root.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use super::overlay::{Overlay, Overlayer};
use crate::error::{BinderError, Result};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree accepted when following `Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// Look up a page attribute on the page or its nearest ancestor that has it.
pub fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// A document under construction.
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    overlayer: Overlayer,
    media_box: [f32; 4],
}

impl OutputDocument {
    /// Create an empty document whose generated pages are `width` x `height`.
    pub fn new(width: f32, height: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            overlayer: Overlayer::new(),
            media_box: [0.0, 0.0, width, height],
        }
    }

    /// Physical page count.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.kids
    }

    /// Page object id at a 0-based physical index.
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.kids.get(index).copied()
    }

    /// The document being assembled.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Append a blank page with the generated page size.
    pub fn push_blank(&mut self) -> Result<ObjectId> {
        let page_id = self.new_blank_page();
        self.kids.push(page_id);
        self.write_page_tree()?;
        Ok(page_id)
    }

    /// Insert `count` blank pages so the first lands at physical `index`.
    pub fn insert_blank_pages(&mut self, index: usize, count: usize) -> Result<Vec<ObjectId>> {
        if index > self.kids.len() {
            return Err(BinderError::consistency(format!(
                "cannot insert pages at {index}, document has {} pages",
                self.kids.len()
            )));
        }

        let inserted: Vec<ObjectId> = (0..count).map(|_| self.new_blank_page()).collect();
        self.kids.splice(index..index, inserted.iter().copied());
        self.write_page_tree()?;
        Ok(inserted)
    }

    /// Append every page of `source`, in order.
    ///
    /// Returns the ids of the appended pages in the output document.
    pub fn append_document(&mut self, mut source: Document) -> Result<Vec<ObjectId>> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Ok(page_ids);
        }

        for &page_id in &page_ids {
            let missing: Vec<(&[u8], Object)> = INHERITABLE
                .iter()
                .filter(|key| {
                    source
                        .get_dictionary(page_id)
                        .map(|page| !page.has(key))
                        .unwrap_or(false)
                })
                .filter_map(|key| {
                    inherited_attribute(&source, page_id, key).map(|value| (*key, value.clone()))
                })
                .collect();

            let page = source.get_dictionary_mut(page_id)?;
            for (key, value) in missing {
                page.set(key, value);
            }
            page.set("Parent", Object::Reference(self.pages_id));
        }

        let max_id = source.max_id;
        for (id, object) in source.objects {
            if is_tree_node(&object) {
                continue;
            }
            self.doc.objects.insert(id, object);
        }
        self.doc.max_id = self.doc.max_id.max(max_id);

        self.kids.extend(page_ids.iter().copied());
        self.write_page_tree()?;
        Ok(page_ids)
    }

    /// Draw `overlay` on the page at a 0-based physical index.
    pub fn overlay(&mut self, index: usize, overlay: &Overlay) -> Result<()> {
        let page_id = self.page_id(index).ok_or_else(|| {
            BinderError::consistency(format!("no page at index {index} to draw on"))
        })?;
        self.overlayer.apply(&mut self.doc, page_id, overlay)
    }

    /// Finish assembly and hand out the document.
    pub fn into_document(self) -> Document {
        self.doc
    }

    fn new_blank_page(&mut self) -> ObjectId {
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let media_box: Vec<Object> = self.media_box.iter().map(|v| Object::Real(*v)).collect();
        self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Resources" => Dictionary::new(),
            "Contents" => content_id,
        })
    }

    fn write_page_tree(&mut self) -> Result<()> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.kids.len() as i64;

        let pages = self.doc.get_dictionary_mut(self.pages_id)?;
        pages.set("Kids", kids);
        pages.set("Count", count);
        Ok(())
    }
}

fn is_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| matches!(name, b"Catalog" | b"Pages"))
        .unwrap_or(false)
}
