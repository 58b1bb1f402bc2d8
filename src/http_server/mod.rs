//! # Libris HTTP Server Module
//!
//! Assembles the Axum application: health check, list endpoints, the
//! not-found fallback, CORS and request tracing.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/v1/:resource` - Paginated list of a resource

pub mod config;
pub mod health;
pub mod server;

pub use config::{AppConfig, ConfigError, ConfigResult, DEFAULT_CONFIG_PATH};
pub use server::HttpServer;
