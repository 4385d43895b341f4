//! Property-based tests for segmentation.
//!
//! These tests verify the invariants the pipeline promises:
//! - Idempotence: normalizing an outline twice gives the same identities
//! - Coverage: chunks reproduce the input, overlap aside
//! - Budget: no chunk exceeds the configured maximum
//! - Split consistency: split parts are numbered `0..N` with `N` recorded
//! - Reduction: `k` results reduce to one in `ceil(log_b(k))` rounds

use std::sync::Arc;

use proptest::prelude::*;
use quire::{
    ChunkOrigin, Chunker, ConcatMerger, GeneratedResult, HierarchicalReducer, Outline,
    OutlineEntry, SectionSplitter, SlidingWindowChunker, StructuredChunk, TokenBudget,
    TokenChunker, Tokenizer, WindowBudget, WordTokenizer,
};

// =============================================================================
// Test Generators
// =============================================================================

/// A sentence of 1..12 lowercase words ending in a period.
fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..12).prop_map(|words| {
        let mut s = words.join(" ");
        s.push('.');
        s
    })
}

/// Paragraphs of sentences, separated by blank lines.
fn prose() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::collection::vec(sentence(), 1..8).prop_map(|s| s.join(" ")),
        1..6,
    )
    .prop_map(|paragraphs| paragraphs.join("\n\n"))
}

/// Outline entries with mixed numbering.
fn outline_entries() -> impl Strategy<Value = Vec<OutlineEntry>> {
    prop::collection::vec(
        (1u32..4, prop::option::of("[1-9](\\.[1-9]){0,2}"), "[A-Z][a-z]{2,10}", 0usize..50),
        0..30,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(level, number, title, page)| {
                let title = match number {
                    Some(n) => format!("{n} {title}"),
                    None => title,
                };
                OutlineEntry::new(level, title, page)
            })
            .collect()
    })
}

// =============================================================================
// Invariant Helpers
// =============================================================================

fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn token_chunker(tokenizer: &Arc<WordTokenizer>, max: usize, overlap: usize) -> TokenChunker {
    TokenChunker::new(tokenizer.clone(), TokenBudget::new(max, overlap).unwrap())
}

/// Smallest `r` with `b^r >= k`.
fn ceil_log(k: usize, b: usize) -> usize {
    let mut rounds = 0;
    let mut reach = 1;
    while reach < k {
        reach *= b;
        rounds += 1;
    }
    rounds
}

// =============================================================================
// Outline Normalizer
// =============================================================================

proptest! {
    #[test]
    fn outline_normalization_idempotent(entries in outline_entries()) {
        let first = Outline::new(entries.clone()).identities();
        let second = Outline::new(entries).identities();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn outline_never_keeps_unnumbered_chapters(entries in outline_entries()) {
        let outline = Outline::new(entries);
        for section in outline.sections() {
            prop_assert!(section.entry.level != 1 || section.identity.section_number.is_some());
        }
    }
}

// =============================================================================
// Token-Bounded Chunker
// =============================================================================

proptest! {
    #[test]
    fn bounded_respects_budget(text in prose(), max in 4usize..60) {
        let tokenizer = Arc::new(WordTokenizer::new());
        let chunks = token_chunker(&tokenizer, max, max / 4)
            .chunk(&text, &ChunkOrigin::default())
            .unwrap();
        for chunk in &chunks {
            prop_assert!(chunk.token_count <= max, "{} > {}", chunk.token_count, max);
        }
    }

    #[test]
    fn bounded_covers_text_without_overlap(text in prose(), max in 4usize..60) {
        let tokenizer = Arc::new(WordTokenizer::new());
        let chunks = token_chunker(&tokenizer, max, 0)
            .chunk(&text, &ChunkOrigin::default())
            .unwrap();
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        prop_assert_eq!(without_whitespace(&joined), without_whitespace(&text));
    }

    #[test]
    fn bounded_ids_sequential(text in prose(), max in 4usize..60) {
        let tokenizer = Arc::new(WordTokenizer::new());
        let chunks = token_chunker(&tokenizer, max, 1)
            .chunk(&text, &ChunkOrigin::default())
            .unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_id, i);
        }
    }

    #[test]
    fn raw_token_windows_reconstruct_stream(
        text in prose(),
        max in 2usize..40,
        overlap_seed in 0usize..40,
    ) {
        let overlap = overlap_seed % max;
        let tokenizer = Arc::new(WordTokenizer::new());
        let chunks = token_chunker(&tokenizer, max, overlap)
            .chunk_by_tokens(&text, &ChunkOrigin::default())
            .unwrap();

        let tokens = tokenizer.encode(&text).unwrap();
        let step = max - overlap;
        prop_assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            let start = i * step;
            let end = (start + max).min(tokens.len());
            prop_assert_eq!(&chunk.content, &tokenizer.decode(&tokens[start..end]).unwrap());
        }
        let last = (chunks.len() - 1) * step;
        prop_assert_eq!((last + max).min(tokens.len()), tokens.len());
    }
}

// =============================================================================
// Section Splitter
// =============================================================================

proptest! {
    #[test]
    fn split_parts_numbered_consistently(text in prose(), max in 4usize..40) {
        let splitter = SectionSplitter::new(token_chunker(&Arc::new(WordTokenizer::new()), max, 0));
        let section = StructuredChunk {
            level: 2,
            section_number: "3.1".into(),
            title: "Pages".into(),
            chapter_number: "3".into(),
            chapter_title: "Storage".into(),
            parent_section_number: Some("3".into()),
            parent_section_title: Some("Storage".into()),
            content: text,
            start_page: 10,
            end_page: 12,
            token_count: 0,
            is_split: false,
            split_index: 0,
            total_splits: 1,
        };

        let parts = splitter.split(section).unwrap();
        let n = parts.len();
        prop_assert!(n >= 1);
        for (i, part) in parts.iter().enumerate() {
            prop_assert_eq!(part.split_index, i);
            prop_assert_eq!(part.total_splits, n);
            prop_assert_eq!(part.is_split, n > 1);
            prop_assert!(part.token_count <= max);
        }
    }
}

// =============================================================================
// Sliding-Window Chunker
// =============================================================================

proptest! {
    #[test]
    fn fixed_stride_spans_cover_stream(text in prose(), size in 2usize..50, ratio in 0.0f64..0.9) {
        let Ok(budget) = WindowBudget::new(size, ratio) else {
            return Ok(());
        };
        let tokenizer = Arc::new(WordTokenizer::new());
        let n = tokenizer.count_tokens(&text).unwrap();
        let windows = SlidingWindowChunker::new(tokenizer, budget)
            .fixed_stride(&text, &ChunkOrigin::default())
            .unwrap();

        prop_assert_eq!(windows[0].start_token_index, 0);
        prop_assert_eq!(windows.last().unwrap().end_token_index, n);
        for (i, w) in windows.iter().enumerate() {
            prop_assert_eq!(w.overlap_with_prev, i > 0);
            prop_assert!(w.token_count <= size);
            if i > 0 {
                prop_assert_eq!(w.start_token_index, windows[i - 1].start_token_index + budget.stride());
            }
        }
    }

    #[test]
    fn smart_windows_respect_size(text in prose(), size in 20usize..80, ratio in 0.0f64..0.6) {
        let budget = WindowBudget::new(size, ratio).unwrap();
        let windows = SlidingWindowChunker::new(Arc::new(WordTokenizer::new()), budget)
            .smart_boundaries(&text, &ChunkOrigin::default())
            .unwrap();

        prop_assert!(!windows.is_empty());
        for (i, w) in windows.iter().enumerate() {
            prop_assert!(w.token_count <= size);
            prop_assert_eq!(w.overlap_with_prev, i > 0);
            prop_assert!(w.start_token_index < w.end_token_index);
        }
    }
}

// =============================================================================
// Hierarchical Merge Reducer
// =============================================================================

proptest! {
    #[test]
    fn reducer_rounds_are_log_b(k in 1usize..300, b in 2usize..6) {
        let results: Vec<GeneratedResult> = (0..k)
            .map(|i| GeneratedResult::new(i.to_string(), i, [i + 1], ""))
            .collect();
        let reduction = HierarchicalReducer::new(b)
            .unwrap()
            .reduce(results, &ConcatMerger::with_separator(" "))
            .unwrap();

        prop_assert_eq!(reduction.rounds, ceil_log(k, b));
        let merged = reduction.result.unwrap();
        prop_assert_eq!(merged.source_chunk_ids.len(), k);
        prop_assert_eq!(merged.source_pages.len(), k);
        let expected: Vec<String> = (0..k).map(|i| i.to_string()).collect();
        prop_assert_eq!(merged.content, expected.join(" "));
    }
}

// =============================================================================
// Edge Cases
// =============================================================================

#[test]
fn empty_input_produces_empty_output() {
    let tokenizer = Arc::new(WordTokenizer::new());
    let origin = ChunkOrigin::default();

    let bounded = token_chunker(&tokenizer, 10, 2);
    assert!(bounded.chunk("", &origin).unwrap().is_empty());

    let windows = SlidingWindowChunker::new(tokenizer, WindowBudget::default());
    assert!(windows.chunk("   \n\n ", &origin).unwrap().is_empty());
}

#[test]
fn oversized_sentence_reaches_raw_token_mode() {
    // One 31-token sentence, budget 10: only raw windows can satisfy it
    let tokenizer = Arc::new(WordTokenizer::new());
    let text = format!("{}.", vec!["long"; 30].join(" "));
    let chunks = token_chunker(&tokenizer, 10, 2)
        .chunk(&text, &ChunkOrigin::default())
        .unwrap();

    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|c| c.token_count <= 10));
    // Raw windows cut mid-sentence: only the last one ends with the period
    assert!(chunks[..3].iter().all(|c| !c.content.ends_with('.')));
    assert!(chunks[3].content.ends_with('.'));
}

#[test]
fn chunking_is_deterministic() {
    let text = "The quick brown fox jumps over the lazy dog. Pack my box.\n\nAnother one.";
    let tokenizer = Arc::new(WordTokenizer::new());
    let chunker = token_chunker(&tokenizer, 6, 1);

    let first = chunker.chunk(text, &ChunkOrigin::page(1)).unwrap();
    let second = chunker.chunk(text, &ChunkOrigin::page(1)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unicode_handling() {
    let text = "Hello 世界! Привет мир! مرحبا بالعالم.";
    let tokenizer = Arc::new(WordTokenizer::new());
    let chunks = token_chunker(&tokenizer, 3, 0)
        .chunk_by_tokens(text, &ChunkOrigin::default())
        .unwrap();

    let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(joined, text);
}
