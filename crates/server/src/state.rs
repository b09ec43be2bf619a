//! Application state shared across handlers.

use pagechain_core::config::AppConfig;
use pagechain_store::{ChainManager, DeletionService, IndexStore, ListLocks, RetrievalService};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Durable index store.
    pub store: Arc<dyn IndexStore>,
    /// List bootstrap and append.
    pub chain: Arc<ChainManager>,
    /// Head, page, and chain reads; page replacement.
    pub retrieval: Arc<RetrievalService>,
    /// List cascade delete.
    pub deletion: Arc<DeletionService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// All services share one lock registry so mutations of the same list
    /// are serialized no matter which service performs them.
    pub fn new(config: AppConfig, store: Arc<dyn IndexStore>) -> Self {
        let locks = Arc::new(ListLocks::new());
        let index = config.index.clone();

        Self {
            chain: Arc::new(ChainManager::new(
                store.clone(),
                locks.clone(),
                index.clone(),
            )),
            retrieval: Arc::new(RetrievalService::new(
                store.clone(),
                locks.clone(),
                index.clone(),
            )),
            deletion: Arc::new(DeletionService::new(store.clone(), locks, index)),
            config: Arc::new(config),
            store,
        }
    }
}
