//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sift_engine::Credentials;

use crate::sync::SyncOptions;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL; the service keeps its state in memory without it
    pub database_url: Option<String>,
    /// Bearer token required on admin routes
    pub admin_token: Option<String>,
    /// Search engine credentials from configuration, read-only at runtime
    pub search_credentials: Credentials,
    /// Base URL of the host's REST API
    pub host_api_url: String,
    pub host_api_token: Option<String>,
    /// JSON file listing the synchronized collections
    pub collections_file: Option<PathBuf>,
    /// Timeout of a single search engine request
    pub search_timeout: Duration,
    pub admin_timeout: Duration,
    pub event_timeout: Duration,
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let host_api_url = non_empty("HOST_API_URL").ok_or(ConfigError::MissingHostApiUrl)?;

        Ok(Self {
            host,
            port,
            database_url: non_empty("DATABASE_URL"),
            admin_token: non_empty("ADMIN_TOKEN"),
            search_credentials: Credentials {
                host: non_empty("MEILISEARCH_HOST"),
                api_key: non_empty("MEILISEARCH_API_KEY"),
            },
            host_api_url,
            host_api_token: non_empty("HOST_API_TOKEN"),
            collections_file: non_empty("SIFT_COLLECTIONS_FILE").map(PathBuf::from),
            search_timeout: millis("SEARCH_TIMEOUT_MS", 10_000)?,
            admin_timeout: millis("ADMIN_TIMEOUT_MS", 60_000)?,
            event_timeout: millis("EVENT_TIMEOUT_MS", 30_000)?,
            batch_size: number("BATCH_SIZE", 500)?,
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            batch_size: self.batch_size,
            admin_timeout: self.admin_timeout,
            event_timeout: self.event_timeout,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber(name)),
        None => Ok(default),
    }
}

fn millis(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    number(name, default).map(Duration::from_millis)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOST_API_URL environment variable is required")]
    MissingHostApiUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid {0} value, expected a positive integer")]
    InvalidNumber(&'static str),
}
