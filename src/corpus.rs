//! Page corpus: the immutable set of pages extracted from a source document.
//!
//! Pages are built once (from the PDF text layer in [`crate::extract`] or
//! directly by a caller that ran OCR) and never modified afterwards. Derived
//! values such as roles and explicit numbers live in separate, index-aligned
//! vectors.

use crate::error::{Error, Result};
use serde::Serialize;

/// A single extracted page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    index: usize,
    text: String,
    width: f32,
    height: f32,
    rotation: i32,
    #[serde(skip)]
    embedding: Option<Vec<f32>>,
    signature: Option<u64>,
}

impl Page {
    /// Create a page with its original 0-based index and text.
    ///
    /// Size defaults to A4 portrait and rotation to 0.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            width: 595.0,
            height: 842.0,
            rotation: 0,
            embedding: None,
            signature: None,
        }
    }

    /// Set the page size in points.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the rotation angle in degrees.
    pub fn with_rotation(mut self, rotation: i32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Attach an embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach a 64-bit perceptual signature.
    pub fn with_signature(mut self, signature: u64) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Original 0-based index in the source document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw page text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Rotation angle in degrees.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Embedding vector, if one was supplied.
    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    /// Perceptual signature, if one was computed.
    pub fn signature(&self) -> Option<u64> {
        self.signature
    }
}

/// Ordered collection of pages whose indices are exactly `0..len`.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pages: Vec<Page>,
}

impl Corpus {
    /// Build a corpus, checking that page `i` carries index `i`.
    pub fn new(pages: Vec<Page>) -> Result<Self> {
        if let Some((position, page)) = pages
            .iter()
            .enumerate()
            .find(|(position, page)| page.index != *position)
        {
            return Err(Error::Extraction(format!(
                "page at position {} has index {}; indices must be 0..{}",
                position,
                page.index,
                pages.len()
            )));
        }
        Ok(Self { pages })
    }

    /// Build a corpus from page texts in source order.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Page::new(index, text))
            .collect();
        Self { pages }
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the corpus has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page by original index.
    pub fn get(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// All pages in original order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Iterate pages in original order.
    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    /// Rebuild the corpus, letting `f` finish each page before it is frozen.
    ///
    /// Used to attach embeddings or signatures produced by collaborators.
    pub fn map_pages<F>(self, mut f: F) -> Self
    where
        F: FnMut(Page) -> Page,
    {
        let pages = self
            .pages
            .into_iter()
            .map(|page| {
                let index = page.index;
                let mut page = f(page);
                page.index = index;
                page
            })
            .collect();
        Self { pages }
    }

    /// Number of pages carrying an embedding.
    pub fn embedding_count(&self) -> usize {
        self.pages.iter().filter(|p| p.embedding.is_some()).count()
    }

    /// Whether every page carries a perceptual signature.
    pub fn has_all_signatures(&self) -> bool {
        !self.pages.is_empty() && self.pages.iter().all(|p| p.signature.is_some())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
