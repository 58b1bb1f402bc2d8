//! # List Query Executor
//!
//! Ties the pipeline together: compile -> validate -> paginate, then runs
//! a bounded fetch and an unbounded count against the store.
//!
//! `fetch` and `count` use the same combined filter (user filter plus
//! injected criteria), so the page and the total always agree.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::store::{DocumentStore, FindQuery};

use super::catalog::IndexCatalog;
use super::compiler::{compile, SortRequest};
use super::errors::QueryResult;
use super::filter::FilterExpr;
use super::paginator::{paginate, PageSpec};
use super::params::RawParams;
use super::sort::SortSpec;
use super::validator::{validate_filter_fields, validate_sort};

/// A validated list query, scoped to one request
pub struct ListQuery<'s> {
    store: &'s dyn DocumentStore,
    collection: String,
    filter: FilterExpr,
    sort: SortSpec,
    page: PageSpec,
}

/// Serializable description of what a list query will run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub collection: String,
    pub filter: Value,
    pub sort: Value,
    pub page: u64,
    pub limit: u64,
    pub skip: u64,
}

impl<'s> ListQuery<'s> {
    /// Build a query for one request.
    ///
    /// Loads the index catalog, then rejects uncovered filter fields and
    /// sorts. `injected` is trusted and skips index validation.
    pub async fn build(
        store: &'s dyn DocumentStore,
        collection: &str,
        raw: &RawParams,
        injected: FilterExpr,
    ) -> QueryResult<ListQuery<'s>> {
        let catalog = IndexCatalog::load(store, collection).await?;
        let compiled = compile(raw, injected);

        validate_filter_fields(&compiled.filter_fields, &catalog)?;
        let sort = match &compiled.sort {
            SortRequest::Default => SortSpec::from_tokens(compiled.sort.tokens()),
            SortRequest::Requested(tokens) => {
                validate_sort(tokens.iter().map(String::as_str), &catalog)?
            }
        };
        let page = paginate(raw);

        let query = ListQuery {
            store,
            collection: collection.to_string(),
            filter: compiled.combined_filter(),
            sort,
            page,
        };
        debug!(
            collection,
            filter = %query.filter.to_native(),
            sort = %query.sort,
            page = query.page.page,
            limit = query.page.limit,
            "compiled list query"
        );
        Ok(query)
    }

    /// Fetch one page: filter, sort, skip, limit
    pub async fn fetch(&self) -> QueryResult<Vec<Value>> {
        let find = FindQuery::new(self.filter.clone())
            .sort(self.sort.clone())
            .skip(self.page.skip())
            .limit(self.page.limit);
        Ok(self.store.find(&self.collection, &find).await?)
    }

    /// Total matching documents, ignoring pagination
    pub async fn count(&self) -> QueryResult<u64> {
        Ok(self
            .store
            .count_documents(&self.collection, &self.filter)
            .await?)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Combined filter the store receives
    pub fn filter(&self) -> &FilterExpr {
        &self.filter
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }

    /// Describe the query without running it
    pub fn plan(&self) -> QueryPlan {
        QueryPlan {
            collection: self.collection.clone(),
            filter: self.filter.to_native(),
            sort: self.sort.to_native(),
            page: self.page.page,
            limit: self.page.limit,
            skip: self.page.skip(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::catalog::IndexDescriptor;
    use crate::query::errors::QueryError;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_collection(
                "books",
                vec![
                    IndexDescriptor::new(["title"]),
                    IndexDescriptor::new(["authors", "year"]),
                ],
            )
            .unwrap();
        for (title, author, year) in [
            ("Dune", "herbert", 1965),
            ("Children of Dune", "herbert", 1976),
            ("Neuromancer", "gibson", 1984),
            ("Count Zero", "gibson", 1986),
        ] {
            store
                .insert(
                    "books",
                    json!({"title": title, "authors": [author], "year": year}),
                )
                .unwrap();
        }
        store
    }

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    #[tokio::test]
    async fn test_default_order_is_most_recent_first() {
        let store = store();
        let query = ListQuery::build(&store, "books", &RawParams::new(), FilterExpr::all())
            .await
            .unwrap();

        let docs = query.fetch().await.unwrap();
        assert_eq!(docs.len(), 4);
        assert_eq!(docs[0]["title"], "Count Zero");
        assert_eq!(query.sort().to_string(), "-id");
    }

    #[tokio::test]
    async fn test_compound_filter_with_range() {
        let store = store();
        let raw = params(&[("authors", "gibson"), ("year[gte]", "1985")]);
        let query = ListQuery::build(&store, "books", &raw, FilterExpr::all())
            .await
            .unwrap();

        let docs = query.fetch().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["title"], "Count Zero");
    }

    #[tokio::test]
    async fn test_uncovered_filter_rejected() {
        let store = store();
        let result =
            ListQuery::build(&store, "books", &params(&[("year", "1984")]), FilterExpr::all())
                .await;

        assert!(matches!(result, Err(QueryError::FilterNotIndexed { .. })));
    }

    #[tokio::test]
    async fn test_count_ignores_pagination() {
        let store = store();
        let raw = params(&[("authors", "herbert"), ("page", "2"), ("limit", "1")]);
        let query = ListQuery::build(&store, "books", &raw, FilterExpr::all())
            .await
            .unwrap();

        assert_eq!(query.fetch().await.unwrap().len(), 1);
        assert_eq!(query.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_injected_criteria_apply_to_fetch_and_count() {
        let store = store();
        let query = ListQuery::build(
            &store,
            "books",
            &RawParams::new(),
            FilterExpr::contains_ci("title", "DUNE"),
        )
        .await
        .unwrap();

        let docs = query.fetch().await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(query.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_plan() {
        let store = store();
        let raw = params(&[("sort", "title"), ("page", "2"), ("limit", "10")]);
        let query = ListQuery::build(&store, "books", &raw, FilterExpr::all())
            .await
            .unwrap();

        let plan = query.plan();
        assert_eq!(plan.collection, "books");
        assert_eq!(plan.filter, json!({}));
        assert_eq!(plan.sort, json!([["title", 1]]));
        assert_eq!(plan.skip, 10);
    }
}
