//! Hierarchical merging of generated results.
//!
//! Each chunk eventually turns into a [`GeneratedResult`] (notes, a
//! summary, whatever the generation step produces). Collapsing hundreds of
//! them into one is done bottom-up in rounds, so no single merge ever sees
//! more than `batch_size` inputs:
//!
//! ```text
//! batch_size = 2, 5 results
//!
//! round 1:  [r0 r1] [r2 r3] [r4]      -> m01  m23  r4
//! round 2:  [m01 m23] [r4]            -> m0123  r4
//! round 3:  [m0123 r4]                -> m01234
//! ```
//!
//! A trailing group of one is carried into the next round untouched. Inside
//! a group, results are folded left to right. For `k` results the reduction
//! takes `ceil(log_b(k))` rounds.
//!
//! ## Merging
//!
//! The reducer owns provenance: chunk ids and pages are unioned, and the
//! chapter title is the first non-empty one. Only the *content* is handed
//! to a [`ContentMerger`], which is usually a call to a language model and
//! may fail. Any closure `Fn(&GeneratedResult, &GeneratedResult) ->
//! Result<String>` is a merger; [`ConcatMerger`] is the plain fallback.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, ReducerConfig, Result, StructuredChunk, TextChunk};

/// Separator [`ConcatMerger`] places between merged contents.
pub const MERGE_SEPARATOR: &str = "\n\n---\n\n";

/// Content generated from one or more chunks, with provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedResult {
    /// The generated text.
    pub content: String,
    /// Ids of the chunks this result covers.
    pub source_chunk_ids: BTreeSet<usize>,
    /// Pages this result covers.
    pub source_pages: BTreeSet<usize>,
    /// Chapter label, empty if unknown.
    pub chapter_title: String,
}

impl GeneratedResult {
    /// Create a result for a single chunk.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        chunk_id: usize,
        source_pages: impl IntoIterator<Item = usize>,
        chapter_title: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source_chunk_ids: BTreeSet::from([chunk_id]),
            source_pages: source_pages.into_iter().collect(),
            chapter_title: chapter_title.into(),
        }
    }

    /// A result generated from a flat chunk.
    #[must_use]
    pub fn for_chunk(chunk: &TextChunk, content: impl Into<String>) -> Self {
        Self::new(
            content,
            chunk.chunk_id,
            chunk.source_pages.iter().copied(),
            chunk.chapter_title.clone(),
        )
    }

    /// A result generated from an outline section.
    #[must_use]
    pub fn for_section(chunk: &StructuredChunk, content: impl Into<String>) -> Self {
        Self::new(
            content,
            chunk.chunk_id(),
            chunk.source_pages(),
            chunk.chapter_title.clone(),
        )
    }
}

/// Combines the content of two results.
///
/// `earlier` always precedes `later` in document order.
pub trait ContentMerger {
    /// Produce the merged content.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures; the reducer passes them
    /// through unchanged.
    fn merge_content(&self, earlier: &GeneratedResult, later: &GeneratedResult) -> Result<String>;
}

impl<F> ContentMerger for F
where
    F: Fn(&GeneratedResult, &GeneratedResult) -> Result<String>,
{
    fn merge_content(&self, earlier: &GeneratedResult, later: &GeneratedResult) -> Result<String> {
        self(earlier, later)
    }
}

/// Joins contents with a separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatMerger {
    separator: String,
}

impl ConcatMerger {
    /// Join with a custom separator.
    #[must_use]
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for ConcatMerger {
    fn default() -> Self {
        Self::with_separator(MERGE_SEPARATOR)
    }
}

impl ContentMerger for ConcatMerger {
    fn merge_content(&self, earlier: &GeneratedResult, later: &GeneratedResult) -> Result<String> {
        Ok(format!("{}{}{}", earlier.content, self.separator, later.content))
    }
}

/// Falls back to concatenation when the wrapped merger fails.
///
/// Failures are logged, never returned. Use this when a partial merge is
/// worth more than an aborted run.
#[derive(Debug, Clone)]
pub struct FallbackMerger<M> {
    inner: M,
    fallback: ConcatMerger,
}

impl<M: ContentMerger> FallbackMerger<M> {
    /// Wrap `inner`.
    pub fn or_concat(inner: M) -> Self {
        Self {
            inner,
            fallback: ConcatMerger::default(),
        }
    }
}

impl<M: ContentMerger> ContentMerger for FallbackMerger<M> {
    fn merge_content(&self, earlier: &GeneratedResult, later: &GeneratedResult) -> Result<String> {
        match self.inner.merge_content(earlier, later) {
            Ok(content) => Ok(content),
            Err(err) => {
                tracing::warn!(error = %err, "merge failed, concatenating instead");
                self.fallback.merge_content(earlier, later)
            }
        }
    }
}

/// The outcome of a reduction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    /// The single remaining result, `None` for empty input.
    pub result: Option<GeneratedResult>,
    /// Merge rounds performed.
    pub rounds: usize,
}

/// Reduces a list of results to one, `batch_size` at a time.
///
/// ```rust
/// use quire::{ConcatMerger, GeneratedResult, HierarchicalReducer};
///
/// let results: Vec<_> = (0..5)
///     .map(|i| GeneratedResult::new(format!("note {i}"), i, [i + 1], "Intro"))
///     .collect();
///
/// let reducer = HierarchicalReducer::new(2).unwrap();
/// let reduction = reducer.reduce(results, &ConcatMerger::with_separator(" | ")).unwrap();
///
/// assert_eq!(reduction.rounds, 3);
/// let merged = reduction.result.unwrap();
/// assert_eq!(merged.content, "note 0 | note 1 | note 2 | note 3 | note 4");
/// assert_eq!(merged.source_chunk_ids.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchicalReducer {
    batch_size: usize,
}

impl HierarchicalReducer {
    /// Create a reducer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] if `batch_size < 2`.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size < 2 {
            return Err(Error::InvalidBatchSize(batch_size));
        }
        Ok(Self { batch_size })
    }

    /// Create a reducer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] if the batch size is below 2.
    pub fn from_config(config: &ReducerConfig) -> Result<Self> {
        Self::new(config.batch_size)
    }

    /// Results merged per group.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Merge two results: content through `merger`, provenance here.
    ///
    /// # Errors
    ///
    /// Propagates merger failures.
    pub fn merge_pair(
        &self,
        earlier: GeneratedResult,
        later: GeneratedResult,
        merger: &dyn ContentMerger,
    ) -> Result<GeneratedResult> {
        let content = merger.merge_content(&earlier, &later)?;
        let GeneratedResult {
            mut source_chunk_ids,
            mut source_pages,
            chapter_title,
            ..
        } = earlier;
        source_chunk_ids.extend(later.source_chunk_ids);
        source_pages.extend(later.source_pages);

        Ok(GeneratedResult {
            content,
            source_chunk_ids,
            source_pages,
            chapter_title: if chapter_title.is_empty() {
                later.chapter_title
            } else {
                chapter_title
            },
        })
    }

    /// Run one round: every group of `batch_size` becomes one result.
    ///
    /// # Errors
    ///
    /// Propagates merger failures.
    pub fn reduce_round(
        &self,
        results: Vec<GeneratedResult>,
        merger: &dyn ContentMerger,
    ) -> Result<Vec<GeneratedResult>> {
        let mut merged = Vec::with_capacity(results.len().div_ceil(self.batch_size));
        let mut results = results.into_iter();

        while let Some(first) = results.next() {
            let mut acc = first;
            for next in results.by_ref().take(self.batch_size - 1) {
                acc = self.merge_pair(acc, next, merger)?;
            }
            merged.push(acc);
        }

        Ok(merged)
    }

    /// Reduce `results` to a single result.
    ///
    /// # Errors
    ///
    /// Propagates merger failures; the partial state is discarded.
    pub fn reduce(
        &self,
        results: Vec<GeneratedResult>,
        merger: &dyn ContentMerger,
    ) -> Result<Reduction> {
        let total = results.len();
        let mut current = results;
        let mut rounds = 0;

        while current.len() > 1 {
            rounds += 1;
            current = self.reduce_round(current, merger)?;
            tracing::debug!(round = rounds, remaining = current.len(), "merge round");
        }

        tracing::info!(results = total, rounds, batch_size = self.batch_size, "reduced results");
        Ok(Reduction {
            result: current.pop(),
            rounds,
        })
    }

    /// Reduce to one result; an empty input gives an empty result.
    ///
    /// # Errors
    ///
    /// Propagates merger failures.
    pub fn reduce_to_single(
        &self,
        results: Vec<GeneratedResult>,
        merger: &dyn ContentMerger,
    ) -> Result<GeneratedResult> {
        Ok(self.reduce(results, merger)?.result.unwrap_or_default())
    }
}

impl Default for HierarchicalReducer {
    fn default() -> Self {
        Self { batch_size: 2 }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn results(n: usize) -> Vec<GeneratedResult> {
        (0..n)
            .map(|i| GeneratedResult::new(i.to_string(), i, [i * 2, i * 2 + 1], ""))
            .collect()
    }

    fn concat() -> ConcatMerger {
        ConcatMerger::with_separator(",")
    }

    #[test]
    fn test_rejects_small_batch() {
        assert!(matches!(HierarchicalReducer::new(1), Err(Error::InvalidBatchSize(1))));
        assert!(matches!(HierarchicalReducer::new(0), Err(Error::InvalidBatchSize(0))));
    }

    #[test]
    fn test_empty_and_single() {
        let reducer = HierarchicalReducer::default();
        let empty = reducer.reduce(vec![], &concat()).unwrap();
        assert_eq!(empty, Reduction::default());
        assert_eq!(reducer.reduce_to_single(vec![], &concat()).unwrap(), GeneratedResult::default());

        let one = reducer.reduce(results(1), &concat()).unwrap();
        assert_eq!(one.rounds, 0);
        assert_eq!(one.result.unwrap().content, "0");
    }

    #[test]
    fn test_order_and_provenance() {
        let reducer = HierarchicalReducer::new(2).unwrap();
        let merged = reducer.reduce_to_single(results(4), &concat()).unwrap();
        assert_eq!(merged.content, "0,1,2,3");
        assert_eq!(merged.source_chunk_ids, (0..4).collect::<BTreeSet<_>>());
        assert_eq!(merged.source_pages, (0..8).collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_trailing_single_carried_unmerged() {
        let calls = Cell::new(0);
        let merger = |a: &GeneratedResult, b: &GeneratedResult| -> Result<String> {
            calls.set(calls.get() + 1);
            Ok(format!("({}+{})", a.content, b.content))
        };
        let reducer = HierarchicalReducer::new(2).unwrap();

        let round = reducer.reduce_round(results(3), &merger).unwrap();
        let contents: Vec<&str> = round.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["(0+1)", "2"]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_groups_fold_left() {
        let merger = |a: &GeneratedResult, b: &GeneratedResult| -> Result<String> {
            Ok(format!("({}+{})", a.content, b.content))
        };
        let reducer = HierarchicalReducer::new(3).unwrap();
        let reduction = reducer.reduce(results(5), &merger).unwrap();
        assert_eq!(reduction.rounds, 2);
        assert_eq!(reduction.result.unwrap().content, "(((0+1)+2)+(3+4))");
    }

    #[test]
    fn test_chapter_title_first_non_empty() {
        let reducer = HierarchicalReducer::default();
        let a = GeneratedResult::new("a", 0, [1], "");
        let b = GeneratedResult::new("b", 1, [2], "Methods");
        let c = GeneratedResult::new("c", 2, [3], "Results");
        let merged = reducer.reduce_to_single(vec![a, b, c], &concat()).unwrap();
        assert_eq!(merged.chapter_title, "Methods");
    }

    #[test]
    fn test_merge_failure_propagates() {
        let failing = |_: &GeneratedResult, _: &GeneratedResult| -> Result<String> {
            Err(Error::merge("model unavailable"))
        };
        let err = HierarchicalReducer::default()
            .reduce(results(2), &failing)
            .unwrap_err();
        assert_eq!(err.to_string(), "model unavailable");
    }

    #[test]
    fn test_fallback_merger_concatenates() {
        let failing = |_: &GeneratedResult, _: &GeneratedResult| -> Result<String> {
            Err(Error::merge("rate limited"))
        };
        let merged = HierarchicalReducer::default()
            .reduce_to_single(results(2), &FallbackMerger::or_concat(failing))
            .unwrap();
        assert_eq!(merged.content, format!("0{MERGE_SEPARATOR}1"));
    }

    #[test]
    fn test_for_chunk_provenance() {
        let chunk = TextChunk {
            content: "body".into(),
            chunk_id: 7,
            source_pages: vec![3, 4],
            chapter_title: "Intro".into(),
            token_count: 1,
        };
        let result = GeneratedResult::for_chunk(&chunk, "notes");
        assert_eq!(result.source_chunk_ids, BTreeSet::from([7]));
        assert_eq!(result.source_pages, BTreeSet::from([3, 4]));
        assert_eq!(result.chapter_title, "Intro");
    }
}
