//! # Index-Guarded List Queries
//!
//! Compiles client filter, sort and pagination parameters into a bounded
//! store query. Filters and sorts the collection's indexes cannot serve are
//! rejected before anything runs.
//!
//! # Pipeline
//!
//! ```text
//! RawParams --compile--> CompiledRequest --validate--> (FilterExpr, SortSpec)
//!           --paginate--> PageSpec
//!                          => ListQuery::fetch / ListQuery::count
//! ```
//!
//! The index catalog is loaded once per `ListQuery::build` and consulted by
//! both validation steps.

pub mod catalog;
pub mod compiler;
pub mod errors;
pub mod executor;
pub mod filter;
pub mod paginator;
pub mod params;
pub mod sort;
pub mod validator;

pub use catalog::{IndexCatalog, IndexDescriptor};
pub use compiler::{compile, CompiledRequest, SortRequest, DEFAULT_SORT};
pub use errors::{QueryError, QueryResult};
pub use executor::{ListQuery, QueryPlan};
pub use filter::{FilterExpr, FilterMatcher, RangeOp};
pub use paginator::{paginate, PageSpec, DEFAULT_LIMIT, MAX_LIMIT};
pub use params::{ParamValue, RawParams};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use validator::{validate_filter_fields, validate_sort};
