//! Token-bounded chunking with a paragraph → sentence → token cascade.
//!
//! Tries progressively finer boundaries until every chunk fits the budget.
//!
//! ## The Algorithm
//!
//! Given `max_tokens = M` and `overlap_tokens = O`:
//!
//! ```text
//! 1. Split on blank lines (paragraphs). Pack paragraphs greedily while the
//!    packed text stays within M tokens.
//! 2. A paragraph that alone exceeds M is split on sentence ends and its
//!    sentences are packed the same way.
//! 3. A sentence that alone exceeds M is cut into raw token windows of M
//!    tokens, each starting M - O tokens after the previous one.
//! ```
//!
//! Only step 3 carries overlap. Paragraph and sentence packing never repeat
//! text.
//!
//! ```text
//! raw windows, M = 10, O = 3
//!
//! tokens:  0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20
//! chunk 0: [0 ............... 10)
//! chunk 1:               [7 ................ 17)
//! chunk 2:                           [14 ............... 21)
//! ```
//!
//! Chunk ids run sequentially across the whole call, whichever step
//! produced them.

use std::sync::Arc;

use crate::sentence::{split_paragraphs, split_sentences};
use crate::{ChunkOrigin, Chunker, Result, TextChunk, TokenBudget, Tokenizer};

/// Token-bounded chunker.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use quire::{ChunkOrigin, Chunker, TokenBudget, TokenChunker, WordTokenizer};
///
/// let chunker = TokenChunker::new(
///     Arc::new(WordTokenizer::new()),
///     TokenBudget::new(8, 2).unwrap(),
/// );
/// let text = "One two three.\n\nFour five six seven eight nine ten eleven twelve.";
/// let chunks = chunker.chunk(text, &ChunkOrigin::page(1)).unwrap();
///
/// assert_eq!(chunks[0].content, "One two three.");
/// assert!(chunks.iter().all(|c| c.token_count <= 8));
/// ```
#[derive(Clone)]
pub struct TokenChunker {
    tokenizer: Arc<dyn Tokenizer>,
    budget: TokenBudget,
}

/// Collects chunks and hands out sequential ids.
struct Sink<'a> {
    origin: &'a ChunkOrigin,
    chunks: Vec<TextChunk>,
}

impl<'a> Sink<'a> {
    fn new(origin: &'a ChunkOrigin) -> Self {
        Self {
            origin,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, content: String, token_count: usize) {
        let id = self.chunks.len();
        self.chunks
            .push(TextChunk::new(content, id, self.origin, token_count));
    }
}

/// Greedy packer shared by paragraph and sentence mode.
struct Packer {
    separator: &'static str,
    current: String,
    tokens: usize,
}

impl Packer {
    fn new(separator: &'static str) -> Self {
        Self {
            separator,
            current: String::new(),
            tokens: 0,
        }
    }

    fn candidate(&self, unit: &str) -> String {
        if self.current.is_empty() {
            unit.to_string()
        } else {
            format!("{}{}{}", self.current, self.separator, unit)
        }
    }

    fn flush(&mut self, sink: &mut Sink<'_>) {
        if !self.current.is_empty() {
            sink.push(std::mem::take(&mut self.current), self.tokens);
        }
        self.tokens = 0;
    }
}

impl TokenChunker {
    /// Create a chunker.
    #[must_use]
    pub fn new(tokenizer: Arc<dyn Tokenizer>, budget: TokenBudget) -> Self {
        Self { tokenizer, budget }
    }

    /// The budget this chunker enforces.
    #[must_use]
    pub fn budget(&self) -> TokenBudget {
        self.budget
    }

    /// The tokenizer this chunker counts with.
    #[must_use]
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Count tokens with this chunker's tokenizer.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        self.tokenizer.count_tokens(text)
    }

    /// Chunk starting at sentence level, skipping paragraph packing.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn chunk_by_sentences(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<TextChunk>> {
        let mut sink = Sink::new(origin);
        self.pack_sentences(text, &mut sink)?;
        Ok(sink.chunks)
    }

    /// Chunk into raw token windows only.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn chunk_by_tokens(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<TextChunk>> {
        let mut sink = Sink::new(origin);
        self.token_windows(text, &mut sink)?;
        Ok(sink.chunks)
    }

    fn pack_paragraphs(&self, text: &str, sink: &mut Sink<'_>) -> Result<()> {
        let max = self.budget.max_tokens();
        let mut packer = Packer::new("\n\n");

        for paragraph in split_paragraphs(text) {
            let candidate = packer.candidate(paragraph);
            let tokens = self.tokenizer.count_tokens(&candidate)?;
            if !self.budget.exceeded_by(tokens) {
                packer.current = candidate;
                packer.tokens = tokens;
                continue;
            }

            packer.flush(sink);
            let tokens = self.tokenizer.count_tokens(paragraph)?;
            if !self.budget.exceeded_by(tokens) {
                packer.current = paragraph.to_string();
                packer.tokens = tokens;
            } else {
                tracing::trace!(tokens, max, "paragraph exceeds budget, packing sentences");
                self.pack_sentences(paragraph, sink)?;
            }
        }

        packer.flush(sink);
        Ok(())
    }

    fn pack_sentences(&self, text: &str, sink: &mut Sink<'_>) -> Result<()> {
        let max = self.budget.max_tokens();
        let mut packer = Packer::new(" ");

        for sentence in split_sentences(text) {
            let candidate = packer.candidate(sentence);
            let tokens = self.tokenizer.count_tokens(&candidate)?;
            if !self.budget.exceeded_by(tokens) {
                packer.current = candidate;
                packer.tokens = tokens;
                continue;
            }

            packer.flush(sink);
            let tokens = self.tokenizer.count_tokens(sentence)?;
            if !self.budget.exceeded_by(tokens) {
                packer.current = sentence.to_string();
                packer.tokens = tokens;
            } else {
                tracing::trace!(tokens, max, "sentence exceeds budget, cutting token windows");
                self.token_windows(sentence, sink)?;
            }
        }

        packer.flush(sink);
        Ok(())
    }

    fn token_windows(&self, text: &str, sink: &mut Sink<'_>) -> Result<()> {
        let tokens = self.tokenizer.encode(text)?;
        let max = self.budget.max_tokens();
        let step = self.budget.step();
        let mut start = 0;

        while start < tokens.len() {
            let end = (start + max).min(tokens.len());
            let window = &tokens[start..end];
            let content = self.tokenizer.decode(window)?;

            // Whitespace-only windows carry nothing worth generating from
            if !content.trim().is_empty() {
                sink.push(content, window.len());
            }

            if end >= tokens.len() {
                break;
            }
            start += step;
        }

        Ok(())
    }
}

impl std::fmt::Debug for TokenChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenChunker")
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl Chunker for TokenChunker {
    fn chunk(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<TextChunk>> {
        let body = text.trim();
        if body.is_empty() {
            return Ok(vec![]);
        }

        let mut sink = Sink::new(origin);
        let tokens = self.tokenizer.count_tokens(body)?;
        if self.budget.fits(tokens).is_le() {
            sink.push(body.to_string(), tokens);
        } else {
            self.pack_paragraphs(body, &mut sink)?;
        }

        tracing::debug!(
            tokens,
            max_tokens = self.budget.max_tokens(),
            chunks = sink.chunks.len(),
            "token-bounded chunking"
        );
        Ok(sink.chunks)
    }

    fn estimate_chunks(&self, token_count: usize) -> usize {
        token_count.div_ceil(self.budget.max_tokens()).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordTokenizer;

    fn chunker(max: usize, overlap: usize) -> TokenChunker {
        TokenChunker::new(
            Arc::new(WordTokenizer::new()),
            TokenBudget::new(max, overlap).unwrap(),
        )
    }

    /// `n` words followed by a period: `n + 1` tokens.
    fn sentence(n: usize) -> String {
        let mut s = vec!["word"; n].join(" ");
        s.push('.');
        s
    }

    #[test]
    fn test_small_body_single_chunk() {
        let chunks = chunker(100, 10)
            .chunk("  Small text.\n\nTwo paragraphs.  ", &ChunkOrigin::page(3))
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Small text.\n\nTwo paragraphs.");
        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].source_pages, vec![3]);
    }

    #[test]
    fn test_body_exactly_at_budget_single_chunk() {
        // 4 words and a period: 5 tokens
        let chunks = chunker(5, 0).chunk("a b c d.", &ChunkOrigin::page(1)).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].token_count, 5);
    }

    #[test]
    fn test_empty_text() {
        let chunks = chunker(100, 10).chunk(" \n\n ", &ChunkOrigin::default()).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_paragraphs_pack_without_overlap() {
        // Each paragraph is 5 tokens; two fit in 12, three do not
        let text = [sentence(4), sentence(4), sentence(4)].join("\n\n");
        let chunks = chunker(12, 3).chunk(&text, &ChunkOrigin::default()).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, format!("{}\n\n{}", sentence(4), sentence(4)));
        assert_eq!(chunks[0].token_count, 10);
        assert_eq!(chunks[1].content, sentence(4));
    }

    #[test]
    fn test_oversized_paragraph_falls_to_sentences() {
        let paragraph = [sentence(4), sentence(4), sentence(4)].join(" ");
        let text = format!("Lead.\n\n{paragraph}");
        let chunks = chunker(11, 0).chunk(&text, &ChunkOrigin::default()).unwrap();

        assert_eq!(chunks[0].content, "Lead.");
        // 15-token paragraph: two sentences (10 tokens) then one
        assert_eq!(chunks[1].token_count, 10);
        assert_eq!(chunks[2].token_count, 5);
        let ids: Vec<usize> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_oversized_sentence_falls_to_token_windows() {
        // 21 tokens, max 10, overlap 3 -> windows at 0, 7, 14
        let text = sentence(20);
        let chunks = chunker(10, 3).chunk(&text, &ChunkOrigin::default()).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].token_count, 10);
        assert_eq!(chunks[1].token_count, 10);
        assert_eq!(chunks[2].token_count, 7);
        assert!(chunks[2].content.ends_with("word."));
    }

    #[test]
    fn test_raw_windows_share_overlap_tokens() {
        let tokenizer = Arc::new(WordTokenizer::new());
        let chunker = TokenChunker::new(tokenizer.clone(), TokenBudget::new(10, 3).unwrap());
        let text = sentence(20);
        let chunks = chunker.chunk_by_tokens(&text, &ChunkOrigin::default()).unwrap();

        let first = tokenizer.encode(&chunks[0].content).unwrap();
        let second = tokenizer.encode(&chunks[1].content).unwrap();
        assert_eq!(first[7..], second[..3]);
    }

    #[test]
    fn test_chunk_by_sentences_entry_point() {
        let text = format!("{}\n\n{}", sentence(2), sentence(2));
        let chunks = chunker(100, 0)
            .chunk_by_sentences(&text, &ChunkOrigin::default())
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].token_count, 6);
    }

    #[test]
    fn test_estimate_chunks() {
        let chunker = chunker(250, 0);
        assert_eq!(chunker.estimate_chunks(0), 1);
        assert_eq!(chunker.estimate_chunks(2000), 8);
    }
}
