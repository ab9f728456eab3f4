//! Page extraction from source PDF bytes.
//!
//! Builds the [`Corpus`] from the document's embedded text layer together with
//! each page's effective MediaBox size and /Rotate value. Inheritable page
//! attributes are resolved through the /Parent chain of the page tree
//! (ISO 32000-1:2008, Section 7.7.3.4).
//!
//! A document that cannot be parsed at all is an extraction failure. A page
//! whose text cannot be decoded is kept with empty text and logged; ordering
//! then falls back to the weaker strategies for it.

use crate::corpus::{Corpus, Page};
use crate::error::{Error, Result};
use crate::pipeline::{Stage, StageLog};
use lopdf::{Document, Object, ObjectId};

/// Maximum page tree depth followed when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Default page size (A4 portrait) used when no MediaBox can be resolved.
const DEFAULT_SIZE: (f32, f32) = (595.0, 842.0);

/// Extracts a page corpus from PDF documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageExtractor;

impl PageExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Parse PDF bytes and extract every page.
    pub fn extract(&self, bytes: &[u8]) -> Result<Corpus> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| Error::Extraction(format!("unreadable PDF: {}", e)))?;
        self.extract_document(&doc)
    }

    /// Extract every page of an already parsed document.
    pub fn extract_document(&self, doc: &Document) -> Result<Corpus> {
        let log = StageLog::new(Stage::Extraction);
        let page_ids = doc.get_pages();
        if page_ids.is_empty() {
            return Err(Error::Extraction("document has no pages".to_string()));
        }

        let mut pages = Vec::with_capacity(page_ids.len());
        for (index, (&page_number, &page_id)) in page_ids.iter().enumerate() {
            let text = match doc.extract_text(&[page_number]) {
                Ok(text) => text,
                Err(e) => {
                    log.page_warn(index, format_args!("text layer unreadable: {}", e));
                    String::new()
                },
            };

            let (width, height) = media_size(doc, page_id).unwrap_or(DEFAULT_SIZE);
            let rotation = inherited_attribute(doc, page_id, b"Rotate")
                .and_then(|obj| obj.as_i64().ok())
                .map(normalize_rotation)
                .unwrap_or(0);

            log.page_debug(
                index,
                format_args!(
                    "extracted {} chars, {}x{} pt, rotation {}",
                    text.len(),
                    width,
                    height,
                    rotation
                ),
            );
            pages.push(
                Page::new(index, text)
                    .with_size(width, height)
                    .with_rotation(rotation),
            );
        }

        log.info(format_args!("extracted {} pages", pages.len()));
        Corpus::new(pages)
    }
}

/// Resolve an attribute on a page node, walking up through /Parent.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth > MAX_TREE_DEPTH {
            return None;
        }
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value).clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    None
}

/// Follow a single indirect reference, returning the object itself otherwise.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn media_size(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?;
    let values = media_box
        .as_array()
        .ok()?
        .iter()
        .map(|v| resolve(doc, v).as_float().ok())
        .collect::<Option<Vec<f32>>>()?;
    match values.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

fn normalize_rotation(rotation: i64) -> i32 {
    (rotation.rem_euclid(360)) as i32
}
