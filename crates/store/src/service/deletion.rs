//! Cascade deletion of a list's pages and articles.

use super::{ListLocks, with_timeout};
use crate::error::StoreResult;
use crate::models::CascadeDeleteStats;
use crate::store::IndexStore;
use pagechain_core::ListId;
use pagechain_core::config::IndexConfig;
use std::sync::Arc;

pub struct DeletionService {
    store: Arc<dyn IndexStore>,
    locks: Arc<ListLocks>,
    config: IndexConfig,
}

impl DeletionService {
    pub fn new(store: Arc<dyn IndexStore>, locks: Arc<ListLocks>, config: IndexConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// Delete every article and page of a list in one transaction.
    ///
    /// The list row and its head pointer survive, so the next append
    /// rebuilds the chain from the same head page id. Other lists are
    /// untouched.
    pub async fn delete_list(&self, list_id: ListId) -> StoreResult<CascadeDeleteStats> {
        let stats = with_timeout(self.config.operation_timeout(), "delete_list", async {
            let _guard = self.locks.acquire(list_id.get()).await;
            self.store.delete_list_with_cascade(list_id.get()).await
        })
        .await?;

        self.locks.prune_idle();

        tracing::info!(
            list_id = %list_id,
            pages = stats.pages,
            articles = stats.articles,
            "List pages deleted"
        );

        Ok(stats)
    }
}
