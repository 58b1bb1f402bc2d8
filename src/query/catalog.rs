//! # Index Catalog
//!
//! The queryable view of a collection's declared indexes.
//!
//! A compound index can serve a query on any leading subset of its fields,
//! so the catalog holds every declared index plus every truncation obtained by
//! dropping trailing fields. Membership is closed under "drop the last field".

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::DocumentStore;

use super::errors::QueryResult;

/// One declared index: its fields in key order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexDescriptor {
    fields: Vec<String>,
}

impl IndexDescriptor {
    /// Create a descriptor from field names in key order
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields in key order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of key fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A single-field index
    pub fn is_simple(&self) -> bool {
        self.fields.len() == 1
    }

    /// The final key field
    pub fn last_field(&self) -> Option<&str> {
        self.fields.last().map(String::as_str)
    }

    /// Proper leading prefixes, longest first: `[a,b,c]` yields `[a,b]`, `[a]`
    pub fn truncations(&self) -> impl Iterator<Item = IndexDescriptor> + '_ {
        (1..self.fields.len()).rev().map(move |len| IndexDescriptor {
            fields: self.fields[..len].to_vec(),
        })
    }
}

/// A catalog entry and the declared index it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// The queryable field sequence
    pub index: IndexDescriptor,
    /// Position of the originating declared index
    pub origin: usize,
    /// True for entries derived by truncation
    pub derived: bool,
}

/// Every queryable field sequence of one collection
#[derive(Debug, Clone, Default)]
pub struct IndexCatalog {
    entries: Vec<CatalogEntry>,
}

impl IndexCatalog {
    /// Fetch a collection's declared indexes and expand them.
    ///
    /// Store failures propagate unchanged.
    pub async fn load(store: &dyn DocumentStore, collection: &str) -> QueryResult<Self> {
        let declared = store.list_indexes(collection).await?;
        let catalog = Self::from_declared(declared);
        debug!(collection, entries = catalog.len(), "loaded index catalog");
        Ok(catalog)
    }

    /// Build a catalog from declared indexes.
    ///
    /// Declared indexes come first in declaration order, followed by the
    /// truncations of each compound index. Empty declarations are ignored.
    pub fn from_declared(declared: impl IntoIterator<Item = IndexDescriptor>) -> Self {
        let declared: Vec<IndexDescriptor> =
            declared.into_iter().filter(|i| !i.is_empty()).collect();

        let mut entries: Vec<CatalogEntry> = declared
            .iter()
            .enumerate()
            .map(|(origin, index)| CatalogEntry {
                index: index.clone(),
                origin,
                derived: false,
            })
            .collect();

        for (origin, index) in declared.iter().enumerate() {
            entries.extend(index.truncations().map(|index| CatalogEntry {
                index,
                origin,
                derived: true,
            }));
        }

        Self { entries }
    }

    /// All entries
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// All queryable field sequences
    pub fn indexes(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.entries.iter().map(|e| &e.index)
    }

    /// Single-field entries
    pub fn simple(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes().filter(|i| i.is_simple())
    }

    /// Multi-field entries, truncations included
    pub fn compound(&self) -> impl Iterator<Item = &IndexDescriptor> {
        self.indexes().filter(|i| i.len() > 1)
    }

    /// Whether the exact field sequence is in the catalog
    pub fn contains(&self, fields: &[&str]) -> bool {
        self.indexes().any(|i| {
            i.fields().len() == fields.len()
                && i.fields().iter().zip(fields).all(|(a, b)| a == b)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
