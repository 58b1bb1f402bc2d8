//! # Document Store
//!
//! The read contract list queries need from a document database, and an
//! in-memory implementation of it.
//!
//! The store is always passed in explicitly. Nothing in the crate reaches
//! for a global handle, so tests can substitute their own implementation.

mod errors;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::{MemoryStore, SeedCollection, SeedFile};

use async_trait::async_trait;
use serde_json::Value;

use crate::query::{FilterExpr, IndexDescriptor, SortSpec};

/// Read operations a list query issues
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declared indexes of a collection, each as ordered field names
    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<IndexDescriptor>>;

    /// Documents matching a cursor description
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Value>>;

    /// Number of documents matching a filter
    async fn count_documents(&self, collection: &str, filter: &FilterExpr) -> StoreResult<u64>;
}

/// Cursor description: filter, then sort, then skip, then limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: FilterExpr,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: FilterExpr) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
