//! # REST API Errors
//!
//! Error types for the REST API module.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::query::QueryError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// Message returned in place of server-side error details
pub const GENERIC_SERVER_MESSAGE: &str = "Something went wrong!";

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Query string could not be decoded
    #[error("Invalid query string: {0}")]
    InvalidQueryString(String),

    /// No resource registered under this name
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// No route for this URL
    #[error("URL not found: {0}.")]
    RouteNotFound(String),

    // ==================
    // Query Errors (4xx or 5xx)
    // ==================
    /// Rejected or failed list query
    #[error("{0}")]
    Query(#[from] QueryError),
}

impl RestError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RestError::InvalidQueryString(_) => StatusCode::BAD_REQUEST,
            RestError::Query(e) if e.is_client_error() => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RestError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            RestError::RouteNotFound(_) => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            RestError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// `fail` for client errors, `error` for server errors
    pub status: &'static str,
    pub message: String,
    pub code: u16,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            Self {
                status: "error",
                message: GENERIC_SERVER_MESSAGE.to_string(),
                code: status.as_u16(),
            }
        } else {
            Self {
                status: "fail",
                message: err.to_string(),
                code: status.as_u16(),
            }
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
