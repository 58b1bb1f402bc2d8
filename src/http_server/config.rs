//! HTTP Server Configuration
//!
//! Host, port, CORS, seed data and the listable resources, read from a JSON
//! file. Every field has a default, so a missing file is a valid config.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rest_api::{default_resources, ResourceConfig};

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "./libris.json";

/// Result type for config loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// JSON seed file for the in-memory store
    #[serde(default)]
    pub seed: Option<PathBuf>,

    /// Listable resources
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://127.0.0.1:3000".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            seed: None,
            resources: default_resources(),
        }
    }
}

impl AppConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Load from a JSON file. A missing file yields the defaults.
    ///
    /// A relative `seed` path is resolved against the config file's directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config: AppConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let (Some(seed), Some(dir)) = (&config.seed, path.parent()) {
            if seed.is_relative() {
                config.seed = Some(dir.join(seed));
            }
        }
        Ok(config)
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
