//! Health Routes

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::rest_api::HealthResponse;

/// Health check route
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_handler))
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse::ok()))
}
