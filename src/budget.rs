//! Token budgets.
//!
//! ## Two Ways to Say "Overlap"
//!
//! The two flat segmenters describe overlap differently:
//!
//! - [`TokenBudget`] (token-bounded chunking) takes an absolute overlap in
//!   tokens. It only applies when a single sentence has to be cut into raw
//!   token windows.
//! - [`WindowBudget`] (sliding windows) takes a ratio of the window size,
//!   rounded to whole tokens.
//!
//! ```text
//! TokenBudget { max: 2048, overlap: 200 }   step = 1848
//! WindowBudget { size: 300, ratio: 0.3 }    overlap = 90, stride = 210
//! ```
//!
//! Both refuse an overlap that would stop the window from moving forward.

use std::cmp::Ordering;

use crate::{Error, Result};

/// Maximum tokens per chunk plus the overlap carried between raw-token
/// windows.
///
/// # Examples
///
/// ```rust
/// use quire::TokenBudget;
///
/// let budget = TokenBudget::new(2048, 200).unwrap();
/// assert_eq!(budget.step(), 1848);
/// assert!(TokenBudget::new(100, 100).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    max_tokens: usize,
    overlap_tokens: usize,
}

impl TokenBudget {
    /// Create a budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`] if `max_tokens == 0` and
    /// [`Error::OverlapExceedsSize`] if `overlap_tokens >= max_tokens`.
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Result<Self> {
        if max_tokens == 0 {
            return Err(Error::InvalidChunkSize(max_tokens));
        }
        if overlap_tokens >= max_tokens {
            return Err(Error::OverlapExceedsSize {
                size: max_tokens,
                overlap: overlap_tokens,
            });
        }
        Ok(Self {
            max_tokens,
            overlap_tokens,
        })
    }

    /// Create a budget with no overlap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`] if `max_tokens == 0`.
    pub fn no_overlap(max_tokens: usize) -> Result<Self> {
        Self::new(max_tokens, 0)
    }

    /// The hard ceiling on tokens per chunk.
    #[must_use]
    pub const fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens shared by consecutive raw-token windows.
    #[must_use]
    pub const fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }

    /// Distance between consecutive raw-token window starts.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.max_tokens - self.overlap_tokens
    }

    /// Compare a token count against the ceiling.
    ///
    /// - `Ordering::Less`: room to grow
    /// - `Ordering::Equal`: exactly full
    /// - `Ordering::Greater`: must split
    #[must_use]
    pub fn fits(&self, tokens: usize) -> Ordering {
        tokens.cmp(&self.max_tokens)
    }

    /// Whether `tokens` exceeds the ceiling.
    #[must_use]
    pub const fn exceeded_by(&self, tokens: usize) -> bool {
        tokens > self.max_tokens
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            overlap_tokens: 200,
        }
    }
}

/// Window size plus a ratio-based overlap.
///
/// ```rust
/// use quire::WindowBudget;
///
/// let budget = WindowBudget::new(300, 0.3).unwrap();
/// assert_eq!(budget.overlap_size(), 90);
/// assert_eq!(budget.stride(), 210);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBudget {
    chunk_size: usize,
    overlap_ratio: f64,
    overlap_size: usize,
}

impl WindowBudget {
    /// Create a window budget; `overlap_size = round(chunk_size * overlap_ratio)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`] if `chunk_size == 0`,
    /// [`Error::InvalidOverlapRatio`] if the ratio is outside `[0.0, 1.0)`,
    /// and [`Error::OverlapExceedsSize`] if rounding leaves no stride.
    pub fn new(chunk_size: usize, overlap_ratio: f64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize(chunk_size));
        }
        if !(0.0..1.0).contains(&overlap_ratio) {
            return Err(Error::InvalidOverlapRatio(overlap_ratio));
        }
        let overlap_size = (chunk_size as f64 * overlap_ratio).round() as usize;
        if overlap_size >= chunk_size {
            return Err(Error::OverlapExceedsSize {
                size: chunk_size,
                overlap: overlap_size,
            });
        }
        Ok(Self {
            chunk_size,
            overlap_ratio,
            overlap_size,
        })
    }

    /// Tokens per window.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The configured overlap ratio.
    #[must_use]
    pub const fn overlap_ratio(&self) -> f64 {
        self.overlap_ratio
    }

    /// Tokens shared by consecutive windows.
    #[must_use]
    pub const fn overlap_size(&self) -> usize {
        self.overlap_size
    }

    /// Distance between consecutive window starts.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.overlap_size
    }
}

impl Default for WindowBudget {
    fn default() -> Self {
        // 1024 * 0.3 = 307.2
        Self {
            chunk_size: 1024,
            overlap_ratio: 0.3,
            overlap_size: 307,
        }
    }
}
