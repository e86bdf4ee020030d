//! Service configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the service can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use wasatext_store::DatabaseOptions;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// SQLite database file.
    /// Env: `WASATEXT_DB_PATH`
    /// Default: platform data directory (`wasatext.db`).
    pub database_path: Option<PathBuf>,

    /// Maximum number of pooled connections.
    /// Env: `WASATEXT_POOL_SIZE`
    /// Default: `8`
    pub pool_size: u32,

    /// Per-request deadline, applied at the transaction boundary.
    /// Env: `WASATEXT_REQUEST_TIMEOUT_MS`
    /// Default: `5000`
    pub request_timeout: Duration,

    /// How long a statement waits on another writer's lock.
    /// Env: `WASATEXT_BUSY_TIMEOUT_MS`
    /// Default: `2000` (never more than the request timeout).
    pub busy_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            pool_size: 8,
            request_timeout: Duration::from_millis(5_000),
            busy_timeout: Duration::from_millis(2_000),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("WASATEXT_DB_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("WASATEXT_POOL_SIZE") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.pool_size = n,
                _ => tracing::warn!(value = %val, "Invalid WASATEXT_POOL_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("WASATEXT_REQUEST_TIMEOUT_MS") {
            match parse_millis(&val) {
                Some(d) => config.request_timeout = d,
                None => tracing::warn!(
                    value = %val,
                    "Invalid WASATEXT_REQUEST_TIMEOUT_MS, using default"
                ),
            }
        }

        if let Some(val) = lookup("WASATEXT_BUSY_TIMEOUT_MS") {
            match parse_millis(&val) {
                Some(d) => config.busy_timeout = d,
                None => tracing::warn!(
                    value = %val,
                    "Invalid WASATEXT_BUSY_TIMEOUT_MS, using default"
                ),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Store options derived from this configuration.
    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            max_connections: self.pool_size,
            busy_timeout: self.busy_timeout.min(self.request_timeout),
            checkout_timeout: self.request_timeout,
        }
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => None,
    }
}
