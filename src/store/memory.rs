//! In-memory document store
//!
//! Collections hold declared indexes and JSON documents behind a `RwLock`.
//! Every collection implicitly carries an `["id"]` index, and documents
//! inserted without an `id` get a monotonic one, so ordering by `-id` lists
//! the most recent documents first.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::query::filter::{compare_values, FilterMatcher};
use crate::query::{FilterExpr, IndexDescriptor, SortDirection, SortSpec};

use super::errors::{StoreError, StoreResult};
use super::{DocumentStore, FindQuery};

/// Primary key field
pub const ID_FIELD: &str = "id";

/// Seed file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub collections: BTreeMap<String, SeedCollection>,
}

/// One seeded collection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedCollection {
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Debug, Default)]
struct Collection {
    indexes: Vec<IndexDescriptor>,
    documents: Vec<Value>,
}

/// Document store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parsed seed data
    pub fn from_seed(seed: SeedFile) -> StoreResult<Self> {
        let store = Self::new();
        for (name, collection) in seed.collections {
            store.create_collection(&name, collection.indexes)?;
            for doc in collection.documents {
                store.insert(&name, doc)?;
            }
        }
        Ok(store)
    }

    /// Build a store from a JSON seed file
    pub fn from_seed_file(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidSeed(format!("cannot read {}: {}", path.display(), e))
        })?;
        let seed: SeedFile = serde_json::from_str(&text).map_err(|e| {
            StoreError::InvalidSeed(format!("cannot parse {}: {}", path.display(), e))
        })?;
        Self::from_seed(seed)
    }

    /// Create a collection, or add indexes to an existing one.
    ///
    /// Duplicate and empty index declarations are ignored.
    pub fn create_collection(&self, name: &str, indexes: Vec<IndexDescriptor>) -> StoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;

        let collection = collections.entry(name.to_string()).or_default();
        for index in indexes {
            let implicit = index.is_simple() && index.fields()[0] == ID_FIELD;
            if !index.is_empty() && !implicit && !collection.indexes.contains(&index) {
                collection.indexes.push(index);
            }
        }
        Ok(())
    }

    /// Insert a document, assigning an id when it has none.
    ///
    /// Returns the stored document.
    pub fn insert(&self, collection: &str, mut doc: Value) -> StoreResult<Value> {
        let Some(object) = doc.as_object_mut() else {
            return Err(StoreError::InvalidDocument(
                "documents must be JSON objects".to_string(),
            ));
        };
        if !object.contains_key(ID_FIELD) {
            let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
            object.insert(ID_FIELD.to_string(), Value::String(format!("{:024x}", id)));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::collection_not_found(collection))?;
        target.documents.push(doc.clone());
        Ok(doc)
    }

    /// Names of all collections, sorted
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn with_collection<T>(
        &self,
        name: &str,
        f: impl FnOnce(&Collection) -> T,
    ) -> StoreResult<T> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::collection_not_found(name))?;
        Ok(f(collection))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_indexes(&self, collection: &str) -> StoreResult<Vec<IndexDescriptor>> {
        self.with_collection(collection, |c| {
            std::iter::once(IndexDescriptor::new([ID_FIELD]))
                .chain(c.indexes.iter().cloned())
                .collect()
        })
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Value>> {
        let matcher = compile_filter(&query.filter)?;
        self.with_collection(collection, |c| {
            let mut matched: Vec<&Value> = c
                .documents
                .iter()
                .filter(|doc| matcher.matches(doc))
                .collect();
            matched.sort_by(|a, b| compare_documents(a, b, &query.sort));

            let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
            let limit = query
                .limit
                .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
                .unwrap_or(usize::MAX);
            matched.into_iter().skip(skip).take(limit).cloned().collect()
        })
    }

    async fn count_documents(&self, collection: &str, filter: &FilterExpr) -> StoreResult<u64> {
        let matcher = compile_filter(filter)?;
        self.with_collection(collection, |c| {
            c.documents.iter().filter(|doc| matcher.matches(doc)).count() as u64
        })
    }
}

fn compile_filter(filter: &FilterExpr) -> StoreResult<FilterMatcher<'_>> {
    filter
        .compile()
        .map_err(|e| StoreError::InvalidFilter(e.to_string()))
}

fn compare_documents(a: &Value, b: &Value, sort: &SortSpec) -> Ordering {
    for key in sort.keys() {
        let ordering = compare_sort_values(a.get(&key.field), b.get(&key.field));
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order across value types: missing and null first, then numbers,
/// strings, objects, arrays, booleans.
fn compare_sort_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }

    match (a, b) {
        (Some(a), Some(b)) if rank(Some(a)) == rank(Some(b)) => {
            compare_values(a, b).unwrap_or(Ordering::Equal)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
