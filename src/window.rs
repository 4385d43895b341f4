//! Sliding-window chunking with ratio-based overlap.
//!
//! ## Fixed Stride
//!
//! Encode once, then step a window of `chunk_size` tokens forward by
//! `stride = chunk_size - overlap_size`:
//!
//! ```text
//! 1000 tokens, chunk_size = 300, overlap_ratio = 0.3
//! overlap_size = 90, stride = 210
//!
//! Window 0: [0..300)
//! Window 1: [210..510)    overlap_with_prev
//! Window 2: [420..720)    overlap_with_prev
//! Window 3: [630..930)    overlap_with_prev
//! Window 4: [840..1000)   overlap_with_prev, reaches the end
//! ```
//!
//! Cheap and exact, but windows start and end mid-sentence.
//!
//! ## Smart Boundaries
//!
//! Pack whole sentences while the window stays within `chunk_size` tokens.
//! When the next sentence does not fit, flush the window and seed the next
//! one with the flushed window's trailing sentences, walking backwards
//! until adding another would exceed `overlap_size` tokens:
//!
//! ```text
//! Window 0: [S1 S2 S3 S4]
//! Window 1:       [S3 S4 S5 S6 S7]      <- S3 S4 fit in overlap_size
//! Window 2:             [S7 S8 S9]
//! ```
//!
//! If the seed plus the next sentence would itself overflow, the oldest
//! seed sentences are dropped first.
//!
//! ## Provenance
//!
//! Both modes record `start_token_index..end_token_index`. In smart mode
//! these are sentence-level sums of token counts, so they are close to, but
//! not always identical with, offsets into a single encoding of the text.
//! Overlapping content is not removed here; that is left to whatever merges
//! the generated results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sentence::split_sentences;
use crate::{
    ChunkOrigin, Chunker, Result, TextChunk, Tokenizer, WindowBudget, WindowConfig, WindowedChunk,
};

/// How windows are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Raw token offsets.
    Fixed,
    /// Whole sentences, sentence-level overlap.
    #[default]
    Smart,
}

/// Sliding-window chunker.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use quire::{ChunkOrigin, SlidingWindowChunker, WindowBudget, WordTokenizer};
///
/// let chunker = SlidingWindowChunker::new(
///     Arc::new(WordTokenizer::new()),
///     WindowBudget::new(10, 0.3).unwrap(),
/// );
/// let text = "a b c d e f g h i j k l m n o p q r s t";
/// let windows = chunker.fixed_stride(text, &ChunkOrigin::page(1)).unwrap();
///
/// // 20 tokens, stride 7: windows at 0, 7, 14
/// assert_eq!(windows.len(), 3);
/// assert!(!windows[0].overlap_with_prev);
/// assert!(windows[1].overlap_with_prev);
/// assert_eq!(windows[1].start_token_index, 7);
/// ```
#[derive(Clone)]
pub struct SlidingWindowChunker {
    tokenizer: Arc<dyn Tokenizer>,
    budget: WindowBudget,
    mode: WindowMode,
}

impl SlidingWindowChunker {
    /// Create a chunker in [`WindowMode::Smart`].
    #[must_use]
    pub fn new(tokenizer: Arc<dyn Tokenizer>, budget: WindowBudget) -> Self {
        Self {
            tokenizer,
            budget,
            mode: WindowMode::default(),
        }
    }

    /// Create a chunker from configuration.
    ///
    /// # Errors
    ///
    /// See [`WindowBudget::new`].
    pub fn from_config(tokenizer: Arc<dyn Tokenizer>, config: &WindowConfig) -> Result<Self> {
        Ok(Self::new(tokenizer, config.window_budget()?).with_mode(config.mode))
    }

    /// Set the window placement mode used by [`windows`](Self::windows).
    #[must_use]
    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    /// The window budget.
    #[must_use]
    pub fn budget(&self) -> WindowBudget {
        self.budget
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Chunk with the configured mode.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn windows(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<WindowedChunk>> {
        let windows = match self.mode {
            WindowMode::Fixed => self.fixed_stride(text, origin)?,
            WindowMode::Smart => self.smart_boundaries(text, origin)?,
        };
        tracing::debug!(
            mode = ?self.mode,
            chunk_size = self.budget.chunk_size(),
            overlap_size = self.budget.overlap_size(),
            windows = windows.len(),
            "sliding-window chunking"
        );
        Ok(windows)
    }

    /// Raw token windows with a fixed stride.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn fixed_stride(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<WindowedChunk>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let tokens = self.tokenizer.encode(text)?;
        let size = self.budget.chunk_size();
        if tokens.len() <= size {
            return Ok(vec![window(text.to_string(), 0, origin, 0..tokens.len(), tokens.len())]);
        }

        let stride = self.budget.stride();
        let mut windows = Vec::with_capacity(self.estimate_chunks(tokens.len()));
        let mut start = 0;

        while start < tokens.len() {
            let end = (start + size).min(tokens.len());
            let content = self.tokenizer.decode(&tokens[start..end])?;

            if !content.trim().is_empty() {
                let id = windows.len();
                windows.push(window(content, id, origin, start..end, end - start));
            }

            if end >= tokens.len() {
                break;
            }
            start += stride;
        }

        Ok(windows)
    }

    /// Sentence-respecting windows with sentence-level overlap.
    ///
    /// # Errors
    ///
    /// Propagates tokenizer failures.
    pub fn smart_boundaries(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<WindowedChunk>> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(vec![]);
        }

        let counts = sentences
            .iter()
            .map(|s| self.tokenizer.count_tokens(s))
            .collect::<Result<Vec<_>>>()?;
        // offsets[i] = tokens before sentence i
        let offsets: Vec<usize> = std::iter::once(0)
            .chain(counts.iter().scan(0, |acc, &n| {
                *acc += n;
                Some(*acc)
            }))
            .collect();

        let size = self.budget.chunk_size();
        let mut windows = Vec::new();
        let mut current: Vec<usize> = Vec::new();

        for i in 0..sentences.len() {
            let candidate = join(&sentences, current.iter().copied().chain([i]));
            if self.tokenizer.count_tokens(&candidate)? <= size {
                current.push(i);
                continue;
            }

            if !current.is_empty() {
                self.flush(&sentences, &offsets, &current, origin, &mut windows)?;
                current = self.overlap_seed(&current, &counts);
                while !current.is_empty() {
                    let seeded = join(&sentences, current.iter().copied().chain([i]));
                    if self.tokenizer.count_tokens(&seeded)? <= size {
                        break;
                    }
                    current.remove(0);
                }
            }
            current.push(i);
        }

        if !current.is_empty() {
            self.flush(&sentences, &offsets, &current, origin, &mut windows)?;
        }

        Ok(windows)
    }

    /// Trailing sentences of a flushed window that fit in `overlap_size`.
    fn overlap_seed(&self, flushed: &[usize], counts: &[usize]) -> Vec<usize> {
        let budget = self.budget.overlap_size();
        let mut seed = Vec::new();
        let mut tokens = 0;

        for &idx in flushed.iter().rev() {
            if tokens + counts[idx] > budget {
                break;
            }
            tokens += counts[idx];
            seed.push(idx);
        }

        seed.reverse();
        seed
    }

    fn flush(
        &self,
        sentences: &[&str],
        offsets: &[usize],
        current: &[usize],
        origin: &ChunkOrigin,
        windows: &mut Vec<WindowedChunk>,
    ) -> Result<()> {
        let content = join(sentences, current.iter().copied());
        let token_count = self.tokenizer.count_tokens(&content)?;
        let first = current[0];
        let last = current[current.len() - 1];
        let id = windows.len();
        windows.push(window(
            content,
            id,
            origin,
            offsets[first]..offsets[last + 1],
            token_count,
        ));
        Ok(())
    }
}

fn join(sentences: &[&str], indices: impl Iterator<Item = usize>) -> String {
    indices.map(|i| sentences[i]).collect::<Vec<_>>().join(" ")
}

fn window(
    content: String,
    chunk_id: usize,
    origin: &ChunkOrigin,
    span: std::ops::Range<usize>,
    token_count: usize,
) -> WindowedChunk {
    WindowedChunk {
        content,
        chunk_id,
        source_pages: origin.source_pages.clone(),
        chapter_title: origin.chapter_title.clone(),
        token_count,
        start_token_index: span.start,
        end_token_index: span.end,
        overlap_with_prev: chunk_id > 0,
    }
}

impl std::fmt::Debug for SlidingWindowChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowChunker")
            .field("budget", &self.budget)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Chunker for SlidingWindowChunker {
    fn chunk(&self, text: &str, origin: &ChunkOrigin) -> Result<Vec<TextChunk>> {
        Ok(self
            .windows(text, origin)?
            .into_iter()
            .map(TextChunk::from)
            .collect())
    }

    fn estimate_chunks(&self, token_count: usize) -> usize {
        token_count
            .saturating_sub(self.budget.overlap_size())
            .div_ceil(self.budget.stride())
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordTokenizer;

    fn chunker(size: usize, ratio: f64) -> SlidingWindowChunker {
        SlidingWindowChunker::new(
            Arc::new(WordTokenizer::new()),
            WindowBudget::new(size, ratio).unwrap(),
        )
    }

    /// `n` words plus a period: `n + 1` tokens.
    fn sentence(word: &str, n: usize) -> String {
        let mut s = vec![word; n].join(" ");
        s.push('.');
        s
    }

    #[test]
    fn test_short_text_single_window() {
        let windows = chunker(100, 0.3)
            .fixed_stride("short text", &ChunkOrigin::page(2))
            .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].content, "short text");
        assert_eq!(windows[0].token_span(), 0..2);
        assert!(!windows[0].overlap_with_prev);
        assert_eq!(windows[0].source_pages, vec![2]);
    }

    #[test]
    fn test_empty_text() {
        let c = chunker(100, 0.3);
        assert!(c.fixed_stride("  ", &ChunkOrigin::default()).unwrap().is_empty());
        assert!(c.smart_boundaries("", &ChunkOrigin::default()).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_stride_spans() {
        // 25 tokens, size 10, overlap 3, stride 7 -> 0, 7, 14, 21
        let text = vec!["w"; 25].join(" ");
        let windows = chunker(10, 0.3).fixed_stride(&text, &ChunkOrigin::default()).unwrap();
        let spans: Vec<_> = windows.iter().map(WindowedChunk::token_span).collect();
        assert_eq!(spans, vec![0..10, 7..17, 14..24, 21..25]);
    }

    #[test]
    fn test_smart_boundaries_seed_with_trailing_sentences() {
        // Sentences of 3 tokens, window 10, overlap 3: one sentence of seed
        let text = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|w| sentence(w, 2))
            .collect::<Vec<_>>()
            .join(" ");
        let windows = chunker(10, 0.3)
            .smart_boundaries(&text, &ChunkOrigin::default())
            .unwrap();

        assert_eq!(windows[0].content, "a a. b b. c c.");
        assert_eq!(windows[1].content, "c c. d d. e e.");
        assert_eq!(windows[2].content, "e e. f f.");
        assert!(windows.iter().skip(1).all(|w| w.overlap_with_prev));
        assert_eq!(windows[1].token_span(), 6..15);
        assert!(windows.iter().all(|w| w.token_count <= 10));
    }

    #[test]
    fn test_smart_boundaries_no_overlap() {
        let text = [sentence("a", 4), sentence("b", 4), sentence("c", 4)].join(" ");
        let windows = chunker(10, 0.0)
            .smart_boundaries(&text, &ChunkOrigin::default())
            .unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].content, sentence("c", 4));
        assert_eq!(windows[1].token_span(), 10..15);
    }

    #[test]
    fn test_seed_gives_way_to_new_sentence() {
        // Overlap 4 would seed "b b b." but seed + 8-token sentence > 10
        let text = [sentence("a", 5), sentence("b", 3), sentence("c", 7)].join(" ");
        let windows = chunker(10, 0.4)
            .smart_boundaries(&text, &ChunkOrigin::default())
            .unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].content, sentence("c", 7));
    }

    #[test]
    fn test_chunker_trait_uses_mode() {
        let text = vec!["w"; 25].join(" ");
        let fixed = chunker(10, 0.3).with_mode(WindowMode::Fixed);
        let chunks = fixed.chunk(&text, &ChunkOrigin::default()).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(fixed.estimate_chunks(25), 4);
    }
}
