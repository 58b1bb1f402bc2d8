//! # Query Errors
//!
//! Rejections raised while turning request parameters into a store query.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for list query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// List query errors
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// A filter field is not served by any index
    #[error("Query is not applicable: field '{field}' is not covered by an index")]
    FilterNotIndexed { field: String },

    /// The requested order matches no index, forward or reversed
    #[error("Sort is not applicable: '{sort}' matches no index")]
    SortNotIndexed { sort: String },

    /// The store failed to answer
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl QueryError {
    /// Create a filter rejection
    pub fn filter_not_indexed(field: impl Into<String>) -> Self {
        QueryError::FilterNotIndexed {
            field: field.into(),
        }
    }

    /// Create a sort rejection
    pub fn sort_not_indexed(sort: impl Into<String>) -> Self {
        QueryError::SortNotIndexed { sort: sort.into() }
    }

    /// Rejections the client must fix; never retried
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::FilterNotIndexed { .. } | QueryError::SortNotIndexed { .. }
        )
    }
}
