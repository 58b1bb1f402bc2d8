//! # REST API HTTP Server
//!
//! Axum routes for the list endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::Uri,
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::query::RawParams;
use crate::store::DocumentStore;

use super::errors::RestError;
use super::handler::{ListHandler, ResourceRegistry};
use super::response::ListResponse;

/// REST API server state
pub struct RestServer {
    handler: Arc<ListHandler>,
}

impl RestServer {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ResourceRegistry) -> Self {
        Self {
            handler: Arc::new(ListHandler::new(store, registry)),
        }
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        Router::new()
            .route("/api/v1/:resource", get(list_handler))
            .with_state(self.handler)
    }
}

/// List records handler
async fn list_handler(
    State(handler): State<Arc<ListHandler>>,
    Path(resource): Path<String>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListResponse<Value>>, RestError> {
    let Query(pairs) = query.map_err(|e| RestError::InvalidQueryString(e.body_text()))?;
    let params = RawParams::from_pairs(pairs);

    let result = handler.list(&resource, params).await?;
    Ok(Json(result))
}

/// Fallback for unmatched URLs
pub async fn not_found_handler(uri: Uri) -> RestError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    RestError::RouteNotFound(target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::handler::default_resources;
    use crate::store::MemoryStore;

    #[test]
    fn test_server_creation() {
        let server = RestServer::new(
            Arc::new(MemoryStore::new()),
            ResourceRegistry::new(default_resources()),
        );
        let _router = server.router();
    }

    #[tokio::test]
    async fn test_not_found_handler() {
        let err = not_found_handler(Uri::from_static("/nowhere")).await;
        assert_eq!(err.to_string(), "URL not found: /nowhere.");

        let err = not_found_handler(Uri::from_static("/nowhere?page=2")).await;
        assert_eq!(err.to_string(), "URL not found: /nowhere?page=2.");
    }
}
