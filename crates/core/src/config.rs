//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bind.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "server.bind {:?} is not a socket address",
                self.bind
            ));
        }
        if self.max_body_bytes == 0 {
            return Err("server.max_body_bytes cannot be 0".to_string());
        }
        Ok(())
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Durable store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// How long a writer waits on a locked database before failing.
        #[serde(default = "default_sqlite_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL. Takes precedence over individual fields.
        url: Option<String>,
        /// Database host.
        host: Option<String>,
        /// Database port (default: 5432).
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        /// Database username.
        username: Option<String>,
        /// Database password.
        /// WARNING: Prefer PAGECHAIN_STORE__PASSWORD env var over storing in config.
        password: Option<String>,
        /// Database name.
        database: Option<String>,
        /// SSL mode for connections.
        ssl_mode: Option<PgSslMode>,
        /// Maximum connections in the pool.
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Statement timeout in milliseconds, enforced by the server.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_sqlite_busy_timeout_secs() -> u64 {
    5
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_max_connections() -> u32 {
    20
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/pagechain.db"),
            busy_timeout_secs: default_sqlite_busy_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Validate store configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StoreConfig::Sqlite { .. } => Ok(()),
            StoreConfig::Postgres {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err("store.max_connections must be at least 1".to_string());
                }
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) => Ok(()),
                    (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(
                        "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                    ),
                    (None, Some(_), None) => Err(
                        "postgres config requires 'database' when using individual fields"
                            .to_string(),
                    ),
                }
            }
        }
    }
}

/// Page chain configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Articles per page before the chain is extended.
    #[serde(default = "default_page_capacity")]
    pub page_capacity: u32,
    /// List created at startup when `bootstrap_on_startup` is set.
    #[serde(default = "default_bootstrap_list_id")]
    pub bootstrap_list_id: i64,
    /// Fixed id of the bootstrap list's first page.
    #[serde(default = "default_first_page_id")]
    pub first_page_id: i64,
    /// How many times an append is retried after a chain conflict.
    #[serde(default = "default_append_retries")]
    pub append_retries: u32,
    /// Upper bound on a single index operation, in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// Create the bootstrap list and its first page at startup.
    #[serde(default = "default_bootstrap_on_startup")]
    pub bootstrap_on_startup: bool,
}

fn default_page_capacity() -> u32 {
    crate::DEFAULT_PAGE_CAPACITY
}

fn default_bootstrap_list_id() -> i64 {
    1
}

fn default_first_page_id() -> i64 {
    1
}

fn default_append_retries() -> u32 {
    1
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}

fn default_bootstrap_on_startup() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            page_capacity: default_page_capacity(),
            bootstrap_list_id: default_bootstrap_list_id(),
            first_page_id: default_first_page_id(),
            append_retries: default_append_retries(),
            operation_timeout_ms: default_operation_timeout_ms(),
            bootstrap_on_startup: default_bootstrap_on_startup(),
        }
    }
}

impl IndexConfig {
    /// Get the operation timeout as a Duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Validate index configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_capacity == 0 {
            return Err("index.page_capacity must be at least 1".to_string());
        }
        if self.page_capacity > crate::MAX_PAGE_CAPACITY {
            return Err(format!(
                "index.page_capacity {} exceeds maximum {}",
                self.page_capacity,
                crate::MAX_PAGE_CAPACITY
            ));
        }
        if self.bootstrap_list_id <= 0 {
            return Err("index.bootstrap_list_id must be positive".to_string());
        }
        if self.first_page_id <= 0 {
            return Err("index.first_page_id must be positive".to_string());
        }
        if self.operation_timeout_ms == 0 {
            return Err("index.operation_timeout_ms cannot be 0".to_string());
        }
        if self.append_retries > 10 {
            return Err(format!(
                "index.append_retries {} exceeds maximum 10",
                self.append_retries
            ));
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Page chain configuration.
    #[serde(default)]
    pub index: IndexConfig,
}

impl AppConfig {
    /// Create a test configuration backed by the given SQLite file.
    ///
    /// **For testing only.**
    pub fn for_testing(sqlite_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::Sqlite {
                path: sqlite_path.into(),
                busy_timeout_secs: default_sqlite_busy_timeout_secs(),
            },
            index: IndexConfig::default(),
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> crate::Result<()> {
        self.server.validate().map_err(crate::Error::InvalidConfig)?;
        self.store.validate().map_err(crate::Error::InvalidConfig)?;
        self.index.validate().map_err(crate::Error::InvalidConfig)?;
        Ok(())
    }
}
