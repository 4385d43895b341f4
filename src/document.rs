//! Document collaborators.
//!
//! The segmentation engine never opens a file. It reads pages and the
//! outline through two traits, so any extractor (a PDF library, an OCR
//! pipeline, a cache of previously extracted text) can sit behind them.
//!
//! Handles are borrowed for the duration of one segmentation pass and
//! released by ordinary ownership when the caller drops them, including
//! when the pass returns early with an error.

use crate::{Error, OutlineEntry, Result};

/// Per-page text access.
///
/// `page_text` must be idempotent and free of side effects: the extractor
/// may read a page more than once while looking for a heading boundary.
pub trait PageSource {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Raw text of the zero-based page `index`.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures; they reach the caller
    /// unchanged.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// A paged document with an outline.
pub trait Document: PageSource {
    /// The outline entries, in document order. Empty if the document has
    /// no outline.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures; they reach the caller
    /// unchanged.
    fn outline(&self) -> Result<Vec<OutlineEntry>>;

    /// Whether the document has any outline entries.
    ///
    /// # Errors
    ///
    /// Propagates [`outline`](Self::outline) failures.
    fn has_outline(&self) -> Result<bool> {
        Ok(!self.outline()?.is_empty())
    }
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        (**self).page_text(index)
    }
}

impl<T: Document + ?Sized> Document for &T {
    fn outline(&self) -> Result<Vec<OutlineEntry>> {
        (**self).outline()
    }
}

impl PageSource for [String] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        self.get(index).cloned().ok_or(Error::PageOutOfRange {
            index,
            count: self.len(),
        })
    }
}

impl PageSource for Vec<String> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        self.as_slice().page_text(index)
    }
}

/// A document whose pages are already extracted text.
///
/// ```rust
/// use quire::{Document, InMemoryDocument, PageSource};
///
/// let doc = InMemoryDocument::new(vec!["1 Intro\nHello.".into()])
///     .with_outline(vec![(1, "1 Intro", 0).into()]);
/// assert_eq!(doc.page_count(), 1);
/// assert!(doc.has_outline().unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryDocument {
    pages: Vec<String>,
    outline: Vec<OutlineEntry>,
}

impl InMemoryDocument {
    /// Create a document from page texts, with no outline.
    #[must_use]
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            outline: Vec::new(),
        }
    }

    /// Attach an outline.
    #[must_use]
    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.outline = outline;
        self
    }

    /// The page texts.
    #[must_use]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

impl PageSource for InMemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        self.pages.page_text(index)
    }
}

impl Document for InMemoryDocument {
    fn outline(&self) -> Result<Vec<OutlineEntry>> {
        Ok(self.outline.clone())
    }
}
