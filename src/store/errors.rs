//! # Store Errors

use thiserror::Error;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not answer
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// No such collection
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A document that cannot be stored
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A filter the store cannot evaluate
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Seed data could not be loaded
    #[error("invalid seed: {0}")]
    InvalidSeed(String),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable(reason.into())
    }

    pub fn collection_not_found(name: impl Into<String>) -> Self {
        StoreError::CollectionNotFound(name.into())
    }
}
