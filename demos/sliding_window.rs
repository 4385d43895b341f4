//! Sliding Windows and Merging
//!
//! Chunks a document with no outline two ways, then folds per-chunk results
//! back into one with the hierarchical reducer.
//!
//! ```bash
//! cargo run --example sliding_window
//! ```

use std::sync::Arc;

use quire::{
    chunk_flat, ChunkOrigin, ConcatMerger, GeneratedResult, HierarchicalReducer, PageRange,
    ReducerConfig, SlidingWindowChunker, WindowConfig, WindowMode, WordTokenizer,
};
use tracing_subscriber::EnvFilter;

fn main() -> quire::Result<()> {
    init_tracing();

    let document = r"Machine learning models learn patterns from data. They generalize these patterns to make predictions on new, unseen examples. This is fundamentally different from traditional programming, where humans write explicit rules.

The training process involves three key steps. Input flows forward through the network. Predictions are compared against ground truth. Gradients flow backward, updating weights.

Deep learning extends this with multiple hidden layers. Each layer learns increasingly abstract representations. Early layers detect edges; later layers recognize objects.";

    let tokenizer = Arc::new(WordTokenizer::new());
    let origin = ChunkOrigin::new(vec![1], "Machine Learning");

    println!("Sliding Windows");
    println!("===============\n");

    for mode in [WindowMode::Fixed, WindowMode::Smart] {
        let config = WindowConfig {
            chunk_size: 40,
            overlap_ratio: 0.25,
            mode,
        };
        let chunker = SlidingWindowChunker::from_config(tokenizer.clone(), &config)?;
        let windows = chunker.windows(document, &origin)?;

        println!("{mode:?} mode: {} windows", windows.len());
        for w in &windows {
            let preview = w.content.chars().take(60).collect::<String>();
            let marker = if w.overlap_with_prev { "+" } else { " " };
            println!(
                "  {marker} [{:>3}..{:>3}) {:>2} tokens  \"{}...\"",
                w.start_token_index,
                w.end_token_index,
                w.token_count,
                preview.trim()
            );
        }
        println!();
    }

    // Flat chunking across pages, then a stand-in "generation" per chunk
    let pages: Vec<String> = document.split("\n\n").map(str::to_string).collect();
    let chunker = SlidingWindowChunker::from_config(tokenizer, &WindowConfig::default())?;
    let chunks = chunk_flat(&chunker, &pages, Some(PageRange::new(0, 2)))?;

    let results: Vec<GeneratedResult> = chunks
        .iter()
        .map(|chunk| GeneratedResult::for_chunk(chunk, format!("summary of chunk {}", chunk.chunk_id)))
        .collect();

    let reducer = HierarchicalReducer::from_config(&ReducerConfig::default())?;
    let reduction = reducer.reduce(results, &ConcatMerger::default())?;

    println!("Merged in {} rounds", reduction.rounds);
    if let Some(merged) = reduction.result {
        println!("  pages: {:?}", merged.source_pages);
        println!("  chunks: {:?}", merged.source_chunk_ids);
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
