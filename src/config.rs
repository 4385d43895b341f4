//! Serializable configuration.
//!
//! The runtime budget types ([`TokenBudget`], [`WindowBudget`]) are
//! validated on construction and cannot hold a bad value. The configs here
//! are their plain-data counterparts: they deserialize from whatever the
//! caller stores settings in, fill missing fields with defaults, and are
//! checked when converted.
//!
//! ```rust
//! use quire::SegmenterConfig;
//!
//! let config: SegmenterConfig = serde_json::from_str(r#"{ "max_tokens": 1024 }"#).unwrap();
//! assert_eq!(config.overlap_tokens, 200);
//! assert_eq!(config.token_budget().unwrap().max_tokens(), 1024);
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, PageRange, Result, TokenBudget, WindowBudget, WindowMode};

/// Settings for outline-driven segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Maximum tokens per chunk.
    pub max_tokens: usize,
    /// Overlap between raw-token windows of an oversized sentence.
    pub overlap_tokens: usize,
    /// Hard cap on pages scanned for one section.
    pub max_search_pages: usize,
    /// Pages scanned past the next outline entry's page.
    pub search_slack_pages: usize,
    /// Only segment outline entries on these pages (zero-based, inclusive).
    pub page_range: Option<PageRange>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            overlap_tokens: 200,
            max_search_pages: 50,
            search_slack_pages: 5,
            page_range: None,
        }
    }
}

impl SegmenterConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns the budget error if `max_tokens`/`overlap_tokens` are invalid.
    pub fn validate(&self) -> Result<()> {
        self.token_budget().map(|_| ())
    }

    /// The token budget described by this configuration.
    ///
    /// # Errors
    ///
    /// See [`TokenBudget::new`].
    pub fn token_budget(&self) -> Result<TokenBudget> {
        TokenBudget::new(self.max_tokens, self.overlap_tokens)
    }

    /// Pages to scan for a section starting on `page` whose successor
    /// starts on `next_page`.
    #[must_use]
    pub fn search_pages(&self, page: usize, next_page: usize) -> usize {
        self.max_search_pages
            .min(next_page.saturating_sub(page).saturating_add(self.search_slack_pages))
    }
}

/// Settings for sliding-window chunking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Tokens per window.
    pub chunk_size: usize,
    /// Fraction of each window shared with the next.
    pub overlap_ratio: f64,
    /// Window placement.
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            overlap_ratio: 0.3,
            mode: WindowMode::default(),
        }
    }
}

impl WindowConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// See [`WindowBudget::new`].
    pub fn validate(&self) -> Result<()> {
        self.window_budget().map(|_| ())
    }

    /// The window budget described by this configuration.
    ///
    /// # Errors
    ///
    /// See [`WindowBudget::new`].
    pub fn window_budget(&self) -> Result<WindowBudget> {
        WindowBudget::new(self.chunk_size, self.overlap_ratio)
    }
}

/// Settings for hierarchical merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Results merged per group, at least 2.
    pub batch_size: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self { batch_size: 2 }
    }
}

impl ReducerConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] if `batch_size < 2`.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 2 {
            return Err(Error::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}
