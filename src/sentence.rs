//! Paragraph and sentence boundaries.
//!
//! Both flat segmenters cut on the same two boundaries:
//!
//! - **Paragraphs** end at a blank line (`\n`, optional whitespace, `\n`).
//! - **Sentences** end at `.`, `!` or `?` followed by whitespace. The
//!   punctuation stays with its sentence; the whitespace is dropped.
//!
//! ```text
//! "It rained. Was it cold? Yes!  Very."
//!  -> ["It rained.", "Was it cold?", "Yes!", "Very."]
//! ```
//!
//! This is the plain punctuation rule, not UAX #29: an abbreviation like
//! "Dr. Smith" does produce a break.

use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("invalid paragraph break regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("invalid sentence end regex"));

/// Split text into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // Keep the (single-byte) punctuation mark
        let end = m.start() + 1;
        sentences.push(&text[start..end]);
        start = m.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
