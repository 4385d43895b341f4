//! Segmenting with a real BPE vocabulary.
//!
//! Run with `cargo test --features tiktoken`.

#![cfg(feature = "tiktoken")]

use std::sync::Arc;

use quire::{ChunkOrigin, Chunker, Cl100kTokenizer, TokenBudget, TokenChunker, Tokenizer};

#[test]
fn cl100k_roundtrip() {
    let tokenizer = Cl100kTokenizer::new().unwrap();
    let text = "Outline-aware segmentation, 1.5.1 Managing Data Flow.";
    let tokens = tokenizer.encode(text).unwrap();
    assert!(!tokens.is_empty());
    assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
}

#[test]
fn cl100k_budget_respected() {
    let tokenizer = Arc::new(Cl100kTokenizer::new().unwrap());
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
    let chunks = TokenChunker::new(tokenizer, TokenBudget::new(50, 5).unwrap())
        .chunk(&text, &ChunkOrigin::page(1))
        .unwrap();

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.token_count <= 50));
}
