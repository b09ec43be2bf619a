//! Durable stores and chain services for the paginated article index.
//!
//! This crate provides:
//! - The list registry, page store, and record store repositories
//! - SQLite and PostgreSQL implementations behind [`IndexStore`]
//! - The chain manager that appends articles and extends page chains
//! - Retrieval and cascade deletion services

pub mod error;
pub mod models;
pub mod postgres;
pub mod repos;
pub mod service;
pub mod store;

pub use error::{ErrorKind, StoreError, StoreResult};
pub use postgres::PostgresStore;
pub use service::{ChainManager, DeletionService, ListLocks, RetrievalService};
pub use store::{IndexStore, SqliteStore};

use pagechain_core::config::StoreConfig;
use std::sync::Arc;

/// Create an index store from configuration.
pub async fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn IndexStore>> {
    match config {
        StoreConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            let store = SqliteStore::new(path, Some(*busy_timeout_secs)).await?;
            Ok(Arc::new(store) as Arc<dyn IndexStore>)
        }
        StoreConfig::Postgres {
            url,
            host,
            port,
            username,
            password,
            database,
            ssl_mode,
            max_connections,
            statement_timeout_ms,
        } => {
            let store = if let Some(url) = url {
                tracing::info!("Connecting to PostgreSQL using connection URL");
                PostgresStore::from_url(url, *max_connections, *statement_timeout_ms).await?
            } else if let (Some(host), Some(database)) = (host.as_ref(), database.as_ref()) {
                PostgresStore::from_params(
                    host,
                    port.unwrap_or(5432),
                    username.as_deref(),
                    password.as_deref(),
                    database,
                    *ssl_mode,
                    *max_connections,
                    *statement_timeout_ms,
                )
                .await?
            } else {
                return Err(StoreError::Config(
                    "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                ));
            };
            Ok(Arc::new(store) as Arc<dyn IndexStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_sqlite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("index.db");
        let config = StoreConfig::Sqlite {
            path: db_path.clone(),
            busy_timeout_secs: 5,
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
        assert!(store.list_lists().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_postgres_requires_target() {
        let config = StoreConfig::Postgres {
            url: None,
            host: None,
            port: Some(5432),
            username: None,
            password: None,
            database: None,
            ssl_mode: None,
            max_connections: 1,
            statement_timeout_ms: None,
        };

        match from_config(&config).await {
            Err(StoreError::Config(msg)) => assert!(msg.contains("url")),
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }
}
