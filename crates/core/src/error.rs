//! Error types for the overlay engine

/// Errors raised by shape construction and overlay store addressing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    /// A polyline already holds as many points as its capacity allows
    #[error("polyline capacity of {capacity} points exceeded")]
    CapacityExceeded { capacity: usize },

    /// A polyline was built from coordinate arrays of different lengths
    #[error("polyline coordinate arrays differ in length (x: {xs}, y: {ys})")]
    InvalidConfiguration { xs: usize, ys: usize },

    /// The overlay store has no shape at this position
    #[error("no shape at index {index} (store length: {len})")]
    NoSuchIndex { index: usize, len: usize },

    /// No overlay store exists for the page
    #[error("no overlay store for page {page}")]
    StoreUninitialized { page: usize },
}

/// Result type for shape and overlay store operations
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Failures reported by the page renderer while producing the base page
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be decoded or rasterized
    #[error("format error: {0}")]
    Format(String),

    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },
}
