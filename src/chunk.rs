//! Chunk types handed to the content-generation step.
//!
//! There are two families:
//!
//! - **Flat** chunks ([`TextChunk`], [`WindowedChunk`]) come from chunking a
//!   run of text with no outline. They carry the pages the text came from
//!   and a chapter label.
//! - **Structured** chunks ([`StructuredChunk`]) come from an outline
//!   section. They carry the section's place in the hierarchy, and, when a
//!   section was too large for one chunk, which part of it they are.
//!
//! Chunks are never mutated after creation.

use serde::{Deserialize, Serialize};

/// Where a run of text came from.
///
/// Passed to flat chunkers so every chunk they produce can be traced back
/// to its pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOrigin {
    /// Page numbers the text was taken from, in order.
    pub source_pages: Vec<usize>,
    /// Chapter label, empty if unknown.
    pub chapter_title: String,
}

impl ChunkOrigin {
    /// Create an origin.
    #[must_use]
    pub fn new(source_pages: Vec<usize>, chapter_title: impl Into<String>) -> Self {
        Self {
            source_pages,
            chapter_title: chapter_title.into(),
        }
    }

    /// An origin spanning a single page.
    #[must_use]
    pub fn page(page: usize) -> Self {
        Self::new(vec![page], "")
    }
}

/// A flat chunk of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The chunk text.
    pub content: String,
    /// Sequential id within one chunking call.
    pub chunk_id: usize,
    /// Pages the text came from.
    pub source_pages: Vec<usize>,
    /// Chapter label.
    pub chapter_title: String,
    /// Tokens in `content`.
    pub token_count: usize,
}

impl TextChunk {
    /// Create a chunk stamped with `origin`.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        chunk_id: usize,
        origin: &ChunkOrigin,
        token_count: usize,
    ) -> Self {
        Self {
            content: content.into(),
            chunk_id,
            source_pages: origin.source_pages.clone(),
            chapter_title: origin.chapter_title.clone(),
            token_count,
        }
    }
}

impl std::fmt::Display for TextChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TextChunk {{ id: {}, tokens: {}, pages: {:?} }}",
            self.chunk_id, self.token_count, self.source_pages
        )
    }
}

/// A flat chunk from a sliding window, with token provenance.
///
/// `start_token_index..end_token_index` locates the window in the token
/// stream of the text it was cut from. Consecutive windows overlap; the
/// indices let a downstream step estimate how much.
///
/// ```text
/// tokens:    0 ........................................ 1000
/// window 0:  [0 ........ 300)
/// window 1:          [210 ........ 510)        overlap_with_prev
/// window 2:                  [420 ........ 720)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowedChunk {
    /// The chunk text.
    pub content: String,
    /// Sequential id within one chunking call.
    pub chunk_id: usize,
    /// Pages the text came from.
    pub source_pages: Vec<usize>,
    /// Chapter label.
    pub chapter_title: String,
    /// Tokens in `content`.
    pub token_count: usize,
    /// First token of the window (inclusive).
    pub start_token_index: usize,
    /// Last token of the window (exclusive).
    pub end_token_index: usize,
    /// Whether this window shares tokens with the one before it.
    pub overlap_with_prev: bool,
}

impl WindowedChunk {
    /// The token span of this window.
    #[must_use]
    pub fn token_span(&self) -> std::ops::Range<usize> {
        self.start_token_index..self.end_token_index
    }
}

impl From<WindowedChunk> for TextChunk {
    fn from(chunk: WindowedChunk) -> Self {
        Self {
            content: chunk.content,
            chunk_id: chunk.chunk_id,
            source_pages: chunk.source_pages,
            chapter_title: chunk.chapter_title,
            token_count: chunk.token_count,
        }
    }
}

/// One outline section, or one part of a section that had to be split.
///
/// For a section split into `N` parts, every part has `is_split == true`,
/// `total_splits == N`, and `split_index` runs `0..N` in order. All parts
/// share the section's page range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredChunk {
    /// Outline level (1 = chapter).
    pub level: u32,
    /// Dotted section number such as `"1.5.1"`, empty if unnumbered.
    pub section_number: String,
    /// Section title without its number.
    pub title: String,
    /// Number of the enclosing chapter, empty if unknown.
    pub chapter_number: String,
    /// Title of the enclosing chapter, empty if unknown.
    pub chapter_title: String,
    /// Number of the parent section (`"1.5"` for `"1.5.1"`).
    pub parent_section_number: Option<String>,
    /// Title of the parent section, if it appears in the outline.
    pub parent_section_title: Option<String>,
    /// The section text.
    pub content: String,
    /// Zero-based page where the section starts.
    pub start_page: usize,
    /// Zero-based page where the next section starts (best effort).
    pub end_page: usize,
    /// Tokens in `content`.
    pub token_count: usize,
    /// Whether this chunk is one part of a split section.
    pub is_split: bool,
    /// Which part this is, zero-based.
    pub split_index: usize,
    /// How many parts the section was split into.
    pub total_splits: usize,
}

impl StructuredChunk {
    /// Id used when a structured chunk stands in for a flat one.
    #[must_use]
    pub fn chunk_id(&self) -> usize {
        self.split_index
    }

    /// One-based page numbers spanned by this chunk.
    #[must_use]
    pub fn source_pages(&self) -> Vec<usize> {
        (self.start_page + 1..=self.end_page.max(self.start_page + 1)).collect()
    }

    /// Display label such as `"1.5.1 Managing Data Flow (part 2/3)"`.
    #[must_use]
    pub fn label(&self) -> String {
        let mut label = if self.section_number.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.section_number, self.title)
        };
        if self.is_split {
            label.push_str(&format!(
                " (part {}/{})",
                self.split_index + 1,
                self.total_splits
            ));
        }
        label
    }
}

impl std::fmt::Display for StructuredChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StructuredChunk {{ {}, pages: {}..{}, tokens: {} }}",
            self.label(),
            self.start_page,
            self.end_page,
            self.token_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(split_index: usize, total_splits: usize) -> StructuredChunk {
        StructuredChunk {
            level: 3,
            section_number: "1.5.1".into(),
            title: "Managing Data Flow".into(),
            chapter_number: "1".into(),
            chapter_title: "Introduction".into(),
            parent_section_number: Some("1.5".into()),
            parent_section_title: Some("Data Science Activities".into()),
            content: "text".into(),
            start_page: 4,
            end_page: 7,
            token_count: 1,
            is_split: total_splits > 1,
            split_index,
            total_splits,
        }
    }

    #[test]
    fn test_source_pages_are_one_based() {
        assert_eq!(section(0, 1).source_pages(), vec![5, 6, 7]);
    }

    #[test]
    fn test_source_pages_never_empty() {
        let mut chunk = section(0, 1);
        chunk.end_page = chunk.start_page;
        assert_eq!(chunk.source_pages(), vec![5]);
    }

    #[test]
    fn test_label() {
        assert_eq!(section(0, 1).label(), "1.5.1 Managing Data Flow");
        assert_eq!(section(1, 3).label(), "1.5.1 Managing Data Flow (part 2/3)");
        assert_eq!(section(1, 3).chunk_id(), 1);
    }

    #[test]
    fn test_windowed_into_text_chunk() {
        let windowed = WindowedChunk {
            content: "abc".into(),
            chunk_id: 2,
            source_pages: vec![3],
            chapter_title: "Ch".into(),
            token_count: 1,
            start_token_index: 10,
            end_token_index: 11,
            overlap_with_prev: true,
        };
        assert_eq!(windowed.token_span(), 10..11);
        let text: TextChunk = windowed.into();
        assert_eq!(text.chunk_id, 2);
        assert_eq!(text.source_pages, vec![3]);
    }
}
