//! # quire
//!
//! Outline-aware segmentation of book-length documents into token-bounded
//! chunks.
//!
//! ## The Problem
//!
//! A textbook is far larger than any model context. Cutting it every N
//! tokens works, but throws away the one structure the author gave it: the
//! table of contents. A chunk that starts halfway through "1.4" and ends
//! halfway through "1.5" cannot be labelled, and notes generated from it
//! cannot be filed under a section.
//!
//! quire cuts along the outline instead, and only falls back to finer
//! boundaries when a section is too large for the budget.
//!
//! ## The Pipeline
//!
//! ```text
//! outline entries ──> Outline ──────────────> section identities
//!                     (numbers, chapters,      (1.5.1 "Managing Data Flow",
//!                      parents)                  chapter 1, parent 1.5)
//!                                                        │
//! page text ──────> BoundaryExtractor <──────────────────┘
//!                   (start heading .. next heading,
//!                    across pages, bounded scan)
//!                                │
//!                                v
//!                   SectionSplitter ──> Vec<StructuredChunk>
//!                   (paragraph -> sentence -> token cascade)
//!
//! generated results ──> HierarchicalReducer ──> one result
//!                       (merge b at a time, in rounds)
//! ```
//!
//! Documents without an outline use a flat [`Chunker`] instead:
//!
//! | Chunker | Boundaries | Overlap |
//! |---------|------------|---------|
//! | [`TokenChunker`] | paragraph, then sentence, then raw tokens | absolute tokens, raw windows only |
//! | [`SlidingWindowChunker`] (fixed) | raw tokens | ratio of the window |
//! | [`SlidingWindowChunker`] (smart) | whole sentences | trailing sentences, ratio of the window |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use quire::{InMemoryDocument, Segmenter, SegmenterConfig, WordTokenizer};
//!
//! let doc = InMemoryDocument::new(vec![
//!     "1 Intro\n1.1 Background\nWhere this started.".into(),
//!     "Still background.".into(),
//!     "2 Methods\nHow it was done.".into(),
//! ])
//! .with_outline(vec![
//!     (1, "1 Intro", 0).into(),
//!     (2, "1.1 Background", 0).into(),
//!     (1, "2 Methods", 2).into(),
//! ]);
//!
//! let segmenter = Segmenter::new(Arc::new(WordTokenizer::new()), SegmenterConfig::default())?;
//! let segmentation = segmenter.segment(&doc)?;
//!
//! let background = &segmentation.chunks[0];
//! assert_eq!(background.title, "Background");
//! assert_eq!(background.chapter_title, "Intro");
//! assert_eq!(background.content, "Where this started. Still background.");
//!
//! // "1 Intro" has no text of its own before "1.1": reported, not lost
//! assert_eq!(segmentation.report.skipped.len(), 1);
//! # Ok::<(), quire::Error>(())
//! ```
//!
//! ## Tokenizers
//!
//! Every budget is measured by one [`Tokenizer`]. [`WordTokenizer`] needs
//! no model files. With the `tiktoken` feature, `Cl100kTokenizer` counts
//! the way GPT-style models do.
//!
//! ## Logging
//!
//! quire emits [`tracing`] events and never installs a subscriber. Missed
//! headings and skipped sections are `warn`; per-document totals are `info`.

mod bounded;
mod budget;
mod chunk;
mod config;
mod document;
mod error;
mod extract;
mod heading;
mod outline;
mod reduce;
mod segment;
mod sentence;
mod split;
mod tokenizer;
mod window;

pub use bounded::TokenChunker;
pub use budget::{TokenBudget, WindowBudget};
pub use chunk::{ChunkOrigin, StructuredChunk, TextChunk, WindowedChunk};
pub use config::{ReducerConfig, SegmenterConfig, WindowConfig};
pub use document::{Document, InMemoryDocument, PageSource};
pub use error::{BoxError, Error, Result};
pub use extract::{BoundaryExtractor, Extraction};
pub use heading::{find_heading, normalize_whitespace, HeadingMatch, HeadingRef};
pub use outline::{
    filter_by_page_range, parent_section_number, parse_section_number, strip_section_number,
    Outline, OutlineEntry, PageRange, Section, SectionIdentity,
};
pub use reduce::{
    ConcatMerger, ContentMerger, FallbackMerger, GeneratedResult, HierarchicalReducer, Reduction,
    MERGE_SEPARATOR,
};
pub use segment::{chunk_flat, Segmentation, SegmentationReport, Segmenter, SkippedSection};
pub use sentence::{split_paragraphs, split_sentences};
pub use split::SectionSplitter;
pub use tokenizer::{Token, Tokenizer, WordTokenizer};
pub use window::{SlidingWindowChunker, WindowMode};

#[cfg(feature = "tiktoken")]
pub use tokenizer::Cl100kTokenizer;

/// A flat chunking strategy.
///
/// Both flat chunkers implement this trait, so the no-outline path can take
/// either:
///
/// ```rust
/// use std::sync::Arc;
/// use quire::{ChunkOrigin, Chunker, SlidingWindowChunker, TokenBudget, TokenChunker,
///             WindowBudget, WordTokenizer};
///
/// fn chunk_page(chunker: &dyn Chunker, text: &str) -> usize {
///     chunker.chunk(text, &ChunkOrigin::page(1)).unwrap().len()
/// }
///
/// let tokenizer = Arc::new(WordTokenizer::new());
/// let bounded = TokenChunker::new(tokenizer.clone(), TokenBudget::default());
/// let windows = SlidingWindowChunker::new(tokenizer, WindowBudget::default());
///
/// let text = "Hello world. This is a test.";
/// assert_eq!(chunk_page(&bounded, text), 1);
/// assert_eq!(chunk_page(&windows, text), 1);
/// ```
pub trait Chunker: Send + Sync {
    /// Split text into chunks stamped with `origin`.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    fn chunk(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<TextChunk>>;

    /// Estimate the number of chunks for a given token count.
    ///
    /// Useful for pre-allocation. May be approximate.
    fn estimate_chunks(&self, token_count: usize) -> usize;
}
