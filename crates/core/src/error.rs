//! Error handling for the HotelFinder core library
//!
//! Only three errors are ever visible to callers of the search layer:
//! invalid input, an exhausted rate-limit quota, and a failed backing
//! provider. Infrastructure faults in the cache, ranker, or limiter are
//! absorbed by the components themselves (each degrades per its own
//! fail-open/fail-closed policy) and never reach this taxonomy.

use thiserror::Error;

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Caller-visible errors from the search layer
#[derive(Error, Debug)]
pub enum SearchError {
    /// Missing or malformed required input; never retried
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Caller exceeded the fixed-window quota; retry after the window elapses
    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        /// Requests left in the current window (always 0 when this is raised)
        remaining: u64,
    },

    /// Backing search provider failed or timed out
    #[error("Search backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl SearchError {
    /// Create an invalid-query error
    pub fn invalid_query<S: Into<String>>(message: S) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create a backend-unavailable error
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::BackendUnavailable(message.into())
    }
}
