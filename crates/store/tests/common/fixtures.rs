//! Test fixtures.

use pagechain_core::config::IndexConfig;
use pagechain_core::{ListId, NewArticle, PageView};
use pagechain_store::{ChainManager, DeletionService, IndexStore, ListLocks, RetrievalService};
use std::sync::Arc;

/// Build a valid article with a fixed author.
#[allow(dead_code)]
pub fn article(title: &str) -> NewArticle {
    NewArticle::new(title, "tester", format!("content of {title}")).expect("valid article")
}

/// Titles `"{prefix}1"` through `"{prefix}{n}"`.
#[allow(dead_code)]
pub fn titles(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{prefix}{i}")).collect()
}

#[allow(dead_code)]
pub fn list_id(id: i64) -> ListId {
    ListId::new(id).expect("valid list id")
}

/// Index config with the given capacity and test-friendly defaults.
#[allow(dead_code)]
pub fn index_config(page_capacity: u32) -> IndexConfig {
    IndexConfig {
        page_capacity,
        operation_timeout_ms: 10_000,
        ..Default::default()
    }
}

/// The three services wired to one store and one lock registry.
#[allow(dead_code)]
pub struct Services {
    pub store: Arc<dyn IndexStore>,
    pub locks: Arc<ListLocks>,
    pub chain: Arc<ChainManager>,
    pub retrieval: Arc<RetrievalService>,
    pub deletion: Arc<DeletionService>,
}

#[allow(dead_code)]
impl Services {
    pub fn new(store: Arc<dyn IndexStore>, config: IndexConfig) -> Self {
        let locks = Arc::new(ListLocks::new());
        Self {
            chain: Arc::new(ChainManager::new(
                store.clone(),
                locks.clone(),
                config.clone(),
            )),
            retrieval: Arc::new(RetrievalService::new(
                store.clone(),
                locks.clone(),
                config.clone(),
            )),
            deletion: Arc::new(DeletionService::new(store.clone(), locks.clone(), config)),
            store,
            locks,
        }
    }

    /// Append every title in order, panicking on failure.
    pub async fn append_all(&self, list: ListId, titles: &[String]) {
        for title in titles {
            self.chain
                .append(list, article(title))
                .await
                .unwrap_or_else(|e| panic!("append {title} failed: {e}"));
        }
    }
}

/// Article titles of every page, head to tail.
#[allow(dead_code)]
pub fn page_titles(pages: &[PageView]) -> Vec<Vec<String>> {
    pages
        .iter()
        .map(|page| page.articles.iter().map(|a| a.title.clone()).collect())
        .collect()
}
