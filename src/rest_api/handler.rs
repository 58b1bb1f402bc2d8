//! # REST API Handler
//!
//! Resolves a resource name to its collection, derives the injected search
//! criteria, and runs the list query.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{FilterExpr, ListQuery, ParamValue, QueryPlan, RawParams};
use crate::store::DocumentStore;

use super::errors::{RestError, RestResult};
use super::response::ListResponse;

/// A listable resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Name in the URL, e.g. `book`
    pub name: String,

    /// Backing collection, e.g. `books`
    pub collection: String,

    /// Field searched case-insensitively when the request names it
    #[serde(default)]
    pub search_field: Option<String>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            search_field: None,
        }
    }

    pub fn with_search_field(mut self, field: impl Into<String>) -> Self {
        self.search_field = Some(field.into());
        self
    }

    /// Move the search parameter out of `params` and into trusted criteria.
    ///
    /// Only a non-empty scalar value is taken; anything else stays a client
    /// filter and goes through index validation.
    pub fn injected_criteria(&self, params: &mut RawParams) -> FilterExpr {
        let Some(field) = &self.search_field else {
            return FilterExpr::all();
        };
        match params.get(field) {
            Some(ParamValue::Single(text)) if !text.is_empty() => {
                let criteria = FilterExpr::contains_ci(field.as_str(), text);
                params.remove(field);
                criteria
            }
            _ => FilterExpr::all(),
        }
    }
}

/// The catalogue's resources
pub fn default_resources() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::new("book", "books").with_search_field("title"),
        ResourceConfig::new("author", "authors").with_search_field("name"),
        ResourceConfig::new("review", "reviews"),
        ResourceConfig::new("user", "users").with_search_field("email"),
    ]
}

/// Resources by name
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, ResourceConfig>,
}

impl ResourceRegistry {
    pub fn new(resources: impl IntoIterator<Item = ResourceConfig>) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|r| (r.name.clone(), r))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> RestResult<&ResourceConfig> {
        self.resources
            .get(name)
            .ok_or_else(|| RestError::ResourceNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }
}

/// Serves list requests against an injected store
pub struct ListHandler {
    store: Arc<dyn DocumentStore>,
    registry: ResourceRegistry,
}

impl ListHandler {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ResourceRegistry) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// One page of a resource plus its total match count.
    ///
    /// Fetch and count are independent reads and run concurrently.
    pub async fn list(&self, resource: &str, params: RawParams) -> RestResult<ListResponse<Value>> {
        let query = self.build(resource, params).await?;
        let (data, total) = tokio::try_join!(query.fetch(), query.count())?;
        Ok(ListResponse::new(data, total))
    }

    /// Validate a request and describe the query without running it
    pub async fn explain(&self, resource: &str, params: RawParams) -> RestResult<QueryPlan> {
        let query = self.build(resource, params).await?;
        Ok(query.plan())
    }

    async fn build(&self, resource: &str, mut params: RawParams) -> RestResult<ListQuery<'_>> {
        let resource = self.registry.get(resource)?;
        let injected = resource.injected_criteria(&mut params);
        let query =
            ListQuery::build(self.store.as_ref(), &resource.collection, &params, injected).await?;
        Ok(query)
    }
}
