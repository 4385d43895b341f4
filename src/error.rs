//! Error types for quire.

/// Boxed error produced by an external collaborator (tokenizer, page
/// source, content merger).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during segmentation and reduction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid chunk size (must be > 0).
    #[error("invalid chunk size: {0} (must be > 0)")]
    InvalidChunkSize(usize),

    /// Overlap is not smaller than the chunk size.
    #[error("overlap {overlap} must be smaller than chunk size {size}")]
    OverlapExceedsSize {
        /// The chunk size.
        size: usize,
        /// The overlap that reached or exceeded the size.
        overlap: usize,
    },

    /// Overlap ratio outside `[0.0, 1.0)`.
    #[error("overlap ratio {0} must be in [0.0, 1.0)")]
    InvalidOverlapRatio(f64),

    /// Merge batch size below two.
    #[error("invalid batch size: {0} (must be >= 2)")]
    InvalidBatchSize(usize),

    /// A page index past the end of the document.
    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// The requested page index.
        index: usize,
        /// Number of pages in the document.
        count: usize,
    },

    /// A heading pattern failed to compile.
    #[error("heading pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// The tokenizer collaborator failed.
    #[error(transparent)]
    Tokenizer(BoxError),

    /// The page source collaborator failed.
    #[error(transparent)]
    PageSource(BoxError),

    /// The content merge collaborator failed.
    #[error(transparent)]
    Merge(BoxError),
}

impl Error {
    /// Wrap a tokenizer failure.
    pub fn tokenizer(err: impl Into<BoxError>) -> Self {
        Self::Tokenizer(err.into())
    }

    /// Wrap a page source failure.
    pub fn page_source(err: impl Into<BoxError>) -> Self {
        Self::PageSource(err.into())
    }

    /// Wrap a content merge failure.
    pub fn merge(err: impl Into<BoxError>) -> Self {
        Self::Merge(err.into())
    }
}

/// Result type for quire operations.
pub type Result<T> = std::result::Result<T, Error>;
