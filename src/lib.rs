//! libris - index-guarded list queries over a book catalogue
//!
//! Clients filter, sort and page through resources with query-string
//! parameters. A request is only executed when every filter field and the
//! sort order are served by a declared index.

pub mod cli;
pub mod http_server;
pub mod query;
pub mod rest_api;
pub mod store;
