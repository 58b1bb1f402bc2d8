//! # Libris REST API Module
//!
//! HTTP list endpoints for the catalogue's resources. Every list request
//! goes through the index-guarded query engine.

pub mod errors;
pub mod handler;
pub mod response;
pub mod server;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use handler::{default_resources, ListHandler, ResourceConfig, ResourceRegistry};
pub use response::{HealthResponse, ListResponse};
pub use server::{not_found_handler, RestServer};
