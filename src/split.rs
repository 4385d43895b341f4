//! Splitting oversized sections.
//!
//! A section that fits the budget passes through as one chunk. A section
//! that does not is cut by the [`TokenChunker`] cascade, and every piece is
//! re-wrapped with the section's hierarchy:
//!
//! ```text
//! 1.5 Data Science Activities (5200 tokens, max 2048)
//!   -> 1.5 Data Science Activities (part 1/3)   split_index 0
//!   -> 1.5 Data Science Activities (part 2/3)   split_index 1
//!   -> 1.5 Data Science Activities (part 3/3)   split_index 2
//! ```

use crate::{ChunkOrigin, Chunker, Result, StructuredChunk, TokenChunker};

/// Splits sections that exceed the token budget.
#[derive(Debug, Clone)]
pub struct SectionSplitter {
    chunker: TokenChunker,
}

impl SectionSplitter {
    /// Create a splitter around a token-bounded chunker.
    #[must_use]
    pub fn new(chunker: TokenChunker) -> Self {
        Self { chunker }
    }

    /// The chunker used for oversized sections.
    #[must_use]
    pub fn chunker(&self) -> &TokenChunker {
        &self.chunker
    }

    /// Split `section` into parts that fit the budget.
    ///
    /// The token count is recomputed from the content. Every part keeps the
    /// section's hierarchy and page range.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn split(&self, mut section: StructuredChunk) -> Result<Vec<StructuredChunk>> {
        let tokens = self.chunker.count_tokens(&section.content)?;
        section.token_count = tokens;

        if !self.chunker.budget().exceeded_by(tokens) {
            section.is_split = false;
            section.split_index = 0;
            section.total_splits = 1;
            return Ok(vec![section]);
        }

        let origin = ChunkOrigin::new(section.source_pages(), section.chapter_title.clone());
        let pieces = self.chunker.chunk(&section.content, &origin)?;
        let total_splits = pieces.len();

        tracing::debug!(
            section = %section.label(),
            tokens,
            parts = total_splits,
            "splitting oversized section"
        );

        Ok(pieces
            .into_iter()
            .enumerate()
            .map(|(split_index, piece)| StructuredChunk {
                content: piece.content,
                token_count: piece.token_count,
                is_split: true,
                split_index,
                total_splits,
                ..section.clone()
            })
            .collect())
    }
}
