//! A store wrapper that counts opened chain transactions.

use async_trait::async_trait;
use pagechain_core::NewArticle;
use pagechain_store::models::{ArticleRow, CascadeDeleteStats, ListRow, PageRow};
use pagechain_store::repos::{ArticleRepo, ChainRepo, ChainTx, ListRepo, PageRepo};
use pagechain_store::{IndexStore, StoreResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delegates every call to `inner` and counts `begin_chain` calls, one per
/// append or list-creation attempt.
#[allow(dead_code)]
pub struct CountingStore {
    inner: Arc<dyn IndexStore>,
    chains: AtomicUsize,
}

#[allow(dead_code)]
impl CountingStore {
    pub fn new(inner: Arc<dyn IndexStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            chains: AtomicUsize::new(0),
        })
    }

    pub fn chains_begun(&self) -> usize {
        self.chains.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.chains.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ListRepo for CountingStore {
    async fn get_list(&self, list_id: i64) -> StoreResult<Option<ListRow>> {
        self.inner.get_list(list_id).await
    }

    async fn get_head_pointer(&self, list_id: i64) -> StoreResult<i64> {
        self.inner.get_head_pointer(list_id).await
    }

    async fn list_lists(&self) -> StoreResult<Vec<ListRow>> {
        self.inner.list_lists().await
    }

    async fn delete_list_with_cascade(&self, list_id: i64) -> StoreResult<CascadeDeleteStats> {
        self.inner.delete_list_with_cascade(list_id).await
    }
}

#[async_trait]
impl PageRepo for CountingStore {
    async fn get_page(&self, page_id: i64) -> StoreResult<Option<PageRow>> {
        self.inner.get_page(page_id).await
    }

    async fn create_page(&self, list_id: i64, page_id: Option<i64>) -> StoreResult<PageRow> {
        self.inner.create_page(list_id, page_id).await
    }

    async fn set_successor(&self, page_id: i64, next_page_id: i64) -> StoreResult<()> {
        self.inner.set_successor(page_id, next_page_id).await
    }

    async fn find_tail(&self, list_id: i64) -> StoreResult<Option<PageRow>> {
        self.inner.find_tail(list_id).await
    }

    async fn find_last_page(&self, list_id: i64) -> StoreResult<Option<PageRow>> {
        self.inner.find_last_page(list_id).await
    }

    async fn list_pages(&self, list_id: i64) -> StoreResult<Vec<PageRow>> {
        self.inner.list_pages(list_id).await
    }
}

#[async_trait]
impl ArticleRepo for CountingStore {
    async fn count_by_page(&self, page_id: i64) -> StoreResult<i64> {
        self.inner.count_by_page(page_id).await
    }

    async fn list_by_page(&self, page_id: i64) -> StoreResult<Vec<ArticleRow>> {
        self.inner.list_by_page(page_id).await
    }

    async fn create_article(&self, page_id: i64, article: &NewArticle) -> StoreResult<ArticleRow> {
        self.inner.create_article(page_id, article).await
    }

    async fn delete_by_page(&self, page_id: i64) -> StoreResult<u64> {
        self.inner.delete_by_page(page_id).await
    }

    async fn delete_by_page_ids(&self, page_ids: &[i64]) -> StoreResult<u64> {
        self.inner.delete_by_page_ids(page_ids).await
    }

    async fn replace_page_articles(
        &self,
        page_id: i64,
        articles: &[NewArticle],
        capacity: u32,
    ) -> StoreResult<Vec<ArticleRow>> {
        self.inner
            .replace_page_articles(page_id, articles, capacity)
            .await
    }
}

#[async_trait]
impl ChainRepo for CountingStore {
    async fn begin_chain(&self) -> StoreResult<Box<dyn ChainTx>> {
        self.chains.fetch_add(1, Ordering::SeqCst);
        self.inner.begin_chain().await
    }
}

#[async_trait]
impl IndexStore for CountingStore {
    async fn migrate(&self) -> StoreResult<()> {
        self.inner.migrate().await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }
}
