//! Basic Outline Segmenting
//!
//! The minimal example: cut a small book along its outline.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example 01_basic_segmenting
//! ```

use std::sync::Arc;

use quire::{InMemoryDocument, Segmenter, SegmenterConfig, WordTokenizer};
use tracing_subscriber::EnvFilter;

fn main() -> quire::Result<()> {
    init_tracing();

    let book = InMemoryDocument::new(vec![
        "Preface\nThis book grew out of lecture notes.".into(),
        "1 Introduction\nData is everywhere.\n1.1 What Is Data Science\n\
         Data science extracts knowledge from data. It blends statistics and computing."
            .into(),
        "1.2 Data Science Activities\nCollecting data comes first.".into(),
        "Cleaning it takes longer than anyone expects.\n1.2.1 Managing Data Flow\n\
         Pipelines move data between stages."
            .into(),
        "2 Basic Algorithms\nSorting and searching are the foundation.".into(),
    ])
    .with_outline(vec![
        (1, "Preface", 0).into(),
        (1, "1 Introduction", 1).into(),
        (2, "1.1 What Is Data Science", 1).into(),
        (2, "1.2 Data Science Activities", 2).into(),
        (3, "1.2.1 Managing Data Flow", 3).into(),
        (1, "2 Basic Algorithms", 4).into(),
    ]);

    let config = SegmenterConfig {
        max_tokens: 12,
        overlap_tokens: 2,
        ..SegmenterConfig::default()
    };
    let segmenter = Segmenter::new(Arc::new(WordTokenizer::new()), config)?;
    let segmentation = segmenter.segment(&book)?;

    println!("Chunks: {}\n", segmentation.chunks.len());
    for chunk in &segmentation.chunks {
        let parent = chunk.parent_section_title.as_deref().unwrap_or("-");
        println!("[{}] chapter: {:?}, parent: {parent}", chunk.label(), chunk.chapter_title);
        println!("    pages {:?}, {} tokens", chunk.source_pages(), chunk.token_count);
        println!("    \"{}\"\n", chunk.content);
    }

    let report = &segmentation.report;
    println!(
        "processed {}, skipped {}, excluded {}, heading fallbacks {}",
        report.processed,
        report.skipped.len(),
        report.excluded,
        report.heading_fallbacks
    );

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
