//! Outline-driven segmentation of a whole document.
//!
//! ```text
//! Document ──outline()──> Outline ──sections()──> for each retained entry:
//!                                                   identity
//!                                                   extract(page .. next heading)
//!                                                   empty? -> report as skipped
//!                                                   split to budget
//!                                                 ──> Vec<StructuredChunk>
//! ```
//!
//! Sections are processed strictly in outline order, and each one is fully
//! chunked before the next is extracted. Nothing is dropped silently: a
//! section with no text is listed in [`SegmentationReport::skipped`], and
//! a section whose start heading could not be located is counted in
//! [`SegmentationReport::heading_fallbacks`].
//!
//! A document with no outline segments to nothing. Use [`chunk_flat`] with
//! any [`Chunker`] for that case.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::outline::filter_by_page_range;
use crate::{
    BoundaryExtractor, ChunkOrigin, Chunker, Document, Outline, PageRange, PageSource, Result,
    SectionSplitter, SegmenterConfig, StructuredChunk, TextChunk, TokenChunker, Tokenizer,
};

/// A section that produced no chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSection {
    /// Position in the (filtered) outline.
    pub index: usize,
    /// Section number, if any.
    pub section_number: Option<String>,
    /// Section title without its number.
    pub title: String,
    /// Page the outline entry points at.
    pub page_index: usize,
}

/// What happened to each outline entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationReport {
    /// Sections that produced at least one chunk.
    pub processed: usize,
    /// Sections with no extractable text.
    pub skipped: Vec<SkippedSection>,
    /// Unnumbered chapters left out of segmentation.
    pub excluded: usize,
    /// Sections whose start heading was not found, so the whole first page
    /// was captured instead.
    pub heading_fallbacks: usize,
}

/// The chunks of a document plus the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Chunks in outline order.
    pub chunks: Vec<StructuredChunk>,
    /// Accounting for every outline entry.
    pub report: SegmentationReport,
}

/// Segments documents along their outline.
///
/// ```rust
/// use std::sync::Arc;
/// use quire::{InMemoryDocument, Segmenter, SegmenterConfig, WordTokenizer};
///
/// let doc = InMemoryDocument::new(vec![
///     "1 Intro\nWelcome to the book.".into(),
///     "2 Methods\nHow it was done.".into(),
/// ])
/// .with_outline(vec![(1, "1 Intro", 0).into(), (1, "2 Methods", 1).into()]);
///
/// let segmenter = Segmenter::new(Arc::new(WordTokenizer::new()), SegmenterConfig::default()).unwrap();
/// let segmentation = segmenter.segment(&doc).unwrap();
///
/// assert_eq!(segmentation.chunks.len(), 2);
/// assert_eq!(segmentation.chunks[0].content, "Welcome to the book.");
/// assert_eq!(segmentation.chunks[1].title, "Methods");
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter {
    splitter: SectionSplitter,
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a segmenter.
    ///
    /// # Errors
    ///
    /// Returns the budget error if the configuration is invalid.
    pub fn new(tokenizer: Arc<dyn Tokenizer>, config: SegmenterConfig) -> Result<Self> {
        let budget = config.token_budget()?;
        Ok(Self {
            splitter: SectionSplitter::new(TokenChunker::new(tokenizer, budget)),
            config,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Segment `doc` along its outline.
    ///
    /// # Errors
    ///
    /// Propagates outline, page source, and tokenizer failures.
    pub fn segment<D: Document + ?Sized>(&self, doc: &D) -> Result<Segmentation> {
        let entries = doc.outline()?;
        if entries.is_empty() {
            tracing::info!("document has no outline, nothing to segment");
            return Ok(Segmentation::default());
        }

        let entries = match self.config.page_range {
            Some(range) => filter_by_page_range(&entries, range),
            None => entries,
        };
        let outline = Outline::new(entries);
        let extractor = BoundaryExtractor::new(doc);
        let page_count = doc.page_count();

        let mut segmentation = Segmentation::default();
        let report = &mut segmentation.report;
        report.excluded = (0..outline.len()).filter(|&i| outline.is_excluded(i)).count();

        for section in outline.sections() {
            let index = section.index;
            let page = section.entry.page_index;
            let next = index + 1;

            let mut end_page = outline.entries().get(next).map_or(page_count, |e| e.page_index);
            if let Some(range) = self.config.page_range {
                end_page = end_page.min(range.last);
            }
            let end_heading = (next < outline.len()).then(|| outline.heading(next));

            let extraction = extractor.extract(
                page,
                &outline.heading(index),
                end_heading.as_ref(),
                self.config.search_pages(page, end_page),
            )?;
            // A miss only falls back when some page was actually captured
            if !extraction.start_found && !extraction.text.is_empty() {
                report.heading_fallbacks += 1;
            }

            let identity = section.identity;
            if extraction.text.is_empty() {
                tracing::warn!(
                    index,
                    page,
                    title = %identity.clean_title,
                    "section has no text, skipping"
                );
                report.skipped.push(SkippedSection {
                    index,
                    section_number: identity.section_number,
                    title: identity.clean_title,
                    page_index: page,
                });
                continue;
            }

            tracing::debug!(
                index,
                page,
                end_page,
                pages_scanned = extraction.pages_scanned,
                title = %identity.clean_title,
                "extracted section"
            );

            let chunk = StructuredChunk {
                level: section.entry.level,
                section_number: identity.section_number.unwrap_or_default(),
                title: identity.clean_title,
                chapter_number: identity.chapter_number,
                chapter_title: identity.chapter_title,
                parent_section_number: identity.parent_section_number,
                parent_section_title: identity.parent_section_title,
                content: extraction.text,
                start_page: page,
                end_page,
                token_count: 0,
                is_split: false,
                split_index: 0,
                total_splits: 1,
            };
            segmentation.chunks.extend(self.splitter.split(chunk)?);
            report.processed += 1;
        }

        tracing::info!(
            chunks = segmentation.chunks.len(),
            processed = report.processed,
            skipped = report.skipped.len(),
            excluded = report.excluded,
            heading_fallbacks = report.heading_fallbacks,
            "segmented document"
        );
        Ok(segmentation)
    }
}

/// Chunk a run of pages with no outline.
///
/// Non-blank pages in `range` (every page if `None`) are joined with blank
/// lines and chunked as one body. The chunks' `source_pages` are the
/// one-based numbers of the pages that contributed text.
///
/// ```rust
/// use std::sync::Arc;
/// use quire::{chunk_flat, PageRange, TokenBudget, TokenChunker, WordTokenizer};
///
/// let pages = vec!["First page.".to_string(), "".into(), "Third page.".into()];
/// let chunker = TokenChunker::new(Arc::new(WordTokenizer::new()), TokenBudget::default());
/// let chunks = chunk_flat(&chunker, &pages, Some(PageRange::new(0, 2))).unwrap();
///
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].source_pages, vec![1, 3]);
/// ```
///
/// # Errors
///
/// Propagates page source and chunker failures.
pub fn chunk_flat<P: PageSource + ?Sized>(
    chunker: &dyn Chunker,
    pages: &P,
    range: Option<PageRange>,
) -> Result<Vec<TextChunk>> {
    let page_count = pages.page_count();
    let (first, last) = match range {
        Some(range) => (range.first, range.last.saturating_add(1).min(page_count)),
        None => (0, page_count),
    };

    let mut texts = Vec::new();
    let mut source_pages = Vec::new();
    for page in first..last {
        let text = pages.page_text(page)?;
        if !text.trim().is_empty() {
            texts.push(text);
            source_pages.push(page + 1);
        }
    }

    chunker.chunk(&texts.join("\n\n"), &ChunkOrigin::new(source_pages, ""))
}
