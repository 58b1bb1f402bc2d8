//! CLI command implementations
//!
//! Every command loads the config, opens the in-memory store from the seed
//! file and makes sure each configured resource has a collection.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::http_server::{AppConfig, HttpServer};
use crate::query::RawParams;
use crate::rest_api::{ListHandler, ResourceRegistry};
use crate::store::{DocumentStore, MemoryStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Dispatch a parsed command
pub async fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config, port } => serve(&config, port).await,
        Command::Query {
            config,
            resource,
            params,
        } => query(&config, &resource, &params).await,
        Command::Explain {
            config,
            resource,
            params,
        } => explain(&config, &resource, &params).await,
    }
}

/// Start the HTTP server and block until shutdown
pub async fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = AppConfig::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }

    let store = open_store(&config)?;
    HttpServer::with_config(config, store).start().await?;
    Ok(())
}

/// Run one list query and print the page
pub async fn query(config_path: &Path, resource: &str, params: &[String]) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let handler = build_handler(&config)?;
    let params = parse_params(params)?;

    report(handler.list(resource, params).await.map_err(CliError::from))
}

/// Validate one list query and print its plan
pub async fn explain(config_path: &Path, resource: &str, params: &[String]) -> CliResult<()> {
    let config = AppConfig::load(config_path)?;
    let handler = build_handler(&config)?;
    let params = parse_params(params)?;

    report(handler.explain(resource, params).await.map_err(CliError::from))
}

/// Print the result, or the error as JSON before propagating it
fn report<T: Serialize>(result: CliResult<T>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(&data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Open the store described by `config`
pub fn open_store(config: &AppConfig) -> CliResult<Arc<dyn DocumentStore>> {
    let store = match &config.seed {
        Some(path) => {
            let store = MemoryStore::from_seed_file(path)?;
            info!(seed = %path.display(), "loaded seed data");
            store
        }
        None => MemoryStore::new(),
    };

    for resource in &config.resources {
        store.create_collection(&resource.collection, Vec::new())?;
    }
    Ok(Arc::new(store))
}

/// List handler over the configured store and resources
pub fn build_handler(config: &AppConfig) -> CliResult<ListHandler> {
    let store = open_store(config)?;
    let registry = ResourceRegistry::new(config.resources.iter().cloned());
    Ok(ListHandler::new(store, registry))
}

/// Parse repeated `key=value` arguments in order
pub fn parse_params(params: &[String]) -> CliResult<RawParams> {
    let pairs = params
        .iter()
        .map(|param| {
            param
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| CliError::invalid_param(param))
        })
        .collect::<CliResult<Vec<_>>>()?;
    Ok(RawParams::from_pairs(pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::query::ParamValue;
    use serde_json::json;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn write_seed(dir: &Path) -> AppConfig {
        let seed = json!({
            "collections": {
                "books": {
                    "indexes": [["title"], ["authors", "year"]],
                    "documents": [
                        {"title": "The Hobbit", "authors": ["tolkien"], "year": 1937},
                        {"title": "Dune", "authors": ["herbert"], "year": 1965}
                    ]
                }
            }
        });
        let path = dir.join("seed.json");
        std::fs::write(&path, seed.to_string()).unwrap();
        AppConfig {
            seed: Some(path),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params(&args(&["year[gte]=1990", "sort=-year", "note=a=b"])).unwrap();

        assert!(matches!(params.get("year"), Some(ParamValue::Nested(_))));
        assert_eq!(params.get_str("sort"), Some("-year"));
        assert_eq!(params.get_str("note"), Some("a=b"));
    }

    #[test]
    fn test_parse_params_rejects_missing_equals() {
        let err = parse_params(&args(&["title"])).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidParam);

        let err = parse_params(&args(&["=x"])).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidParam);
    }

    #[tokio::test]
    async fn test_open_store_creates_resource_collections() {
        let store = open_store(&AppConfig::default()).unwrap();

        for collection in ["books", "authors", "reviews", "users"] {
            let indexes = store.list_indexes(collection).await.unwrap();
            assert_eq!(indexes.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_build_handler_from_seed() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_seed(dir.path());
        let handler = build_handler(&config).unwrap();

        let params = parse_params(&args(&["authors=tolkien", "year[lt]=2000"])).unwrap();
        let page = handler.list("book", params).await.unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.data[0]["title"], "The Hobbit");
    }

    #[test]
    fn test_missing_seed_file_fails() {
        let config = AppConfig {
            seed: Some("/nonexistent/seed.json".into()),
            ..Default::default()
        };
        let err = open_store(&config).err().unwrap();
        assert_eq!(err.code(), CliErrorCode::StoreError);
    }
}
