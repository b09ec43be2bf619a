//! Read paths and whole-page replacement.

use super::{ListLocks, with_timeout};
use crate::error::{StoreError, StoreResult};
use crate::models::PageRow;
use crate::repos::ChainTx;
use crate::store::IndexStore;
use pagechain_core::config::IndexConfig;
use pagechain_core::{Article, ListHead, ListId, NewArticle, PageId, PageView};
use std::collections::HashSet;
use std::sync::Arc;

/// Serves head lookups, page reads, and page replacement.
pub struct RetrievalService {
    store: Arc<dyn IndexStore>,
    locks: Arc<ListLocks>,
    config: IndexConfig,
}

impl RetrievalService {
    pub fn new(store: Arc<dyn IndexStore>, locks: Arc<ListLocks>, config: IndexConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// The head marker of a list. Fails with `NotFound` for an unknown list.
    pub async fn get_head(&self, list_id: ListId) -> StoreResult<ListHead> {
        let head = self.store.get_head_pointer(list_id.get()).await?;
        Ok(ListHead {
            list_id,
            next_page_id: PageId::from_stored(head),
        })
    }

    /// A page with its articles in insertion order.
    pub async fn get_page(&self, page_id: PageId) -> StoreResult<PageView> {
        let page = self
            .store
            .get_page(page_id.get())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("page {page_id} not found")))?;
        self.view(page).await
    }

    /// Replace every article on a page in one step.
    ///
    /// The page's successor is unchanged. An open page accepts up to the page
    /// capacity; a closed page must be given exactly the page capacity.
    pub async fn replace_page_articles(
        &self,
        page_id: PageId,
        articles: Vec<NewArticle>,
    ) -> StoreResult<PageView> {
        with_timeout(self.config.operation_timeout(), "replace_page_articles", async {
            let list_id = self
                .store
                .get_page(page_id.get())
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("page {page_id} not found")))?
                .list_id;

            let _guard = self.locks.acquire(list_id).await;
            let rows = self
                .store
                .replace_page_articles(page_id.get(), &articles, self.config.page_capacity)
                .await?;

            // Read the page back under the lock so the successor is current.
            let page = self
                .store
                .get_page(page_id.get())
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("page {page_id} not found")))?;

            tracing::info!(
                list_id,
                page_id = %page_id,
                articles = rows.len(),
                "Page articles replaced"
            );

            Ok(PageView {
                page_id,
                list_id: ListId::from_stored(page.list_id),
                articles: rows.into_iter().map(Article::from).collect(),
                next_page_id: page.next_page_id.map(PageId::from_stored),
            })
        })
        .await
    }

    /// Every page of a list from head to tail, following successor links.
    ///
    /// The walk runs in one chain transaction holding the list's database
    /// lock, so a concurrent append or delete lands entirely before or after
    /// it. Returns an empty chain for a list whose pages were deleted. A cycle, a link to a page of another
    /// list, or a dangling link is a `Conflict`.
    pub async fn walk_chain(&self, list_id: ListId) -> StoreResult<Vec<PageView>> {
        with_timeout(self.config.operation_timeout(), "walk_chain", async {
            let mut tx = self.store.begin_chain().await?;
            let pages = walk_in(tx.as_mut(), list_id).await?;
            drop(tx);
            Ok(pages)
        })
        .await
    }

    async fn view(&self, page: PageRow) -> StoreResult<PageView> {
        let articles = self.store.list_by_page(page.id).await?;
        Ok(PageView {
            page_id: PageId::from_stored(page.id),
            list_id: ListId::from_stored(page.list_id),
            articles: articles.into_iter().map(Article::from).collect(),
            next_page_id: page.next_page_id.map(PageId::from_stored),
        })
    }
}

async fn walk_in(tx: &mut dyn ChainTx, list_id: ListId) -> StoreResult<Vec<PageView>> {
    tx.lock_list(list_id.get()).await?;
    let list = tx
        .get_list(list_id.get())
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("list {list_id} not found")))?;

    let mut pages = Vec::new();
    if list.tail_page_id.is_none() {
        return Ok(pages);
    }

    let mut seen = HashSet::new();
    let mut next = Some(list.head_pointer);
    while let Some(page_id) = next {
        if !seen.insert(page_id) {
            return Err(StoreError::Conflict(format!(
                "chain of list {list_id} revisits page {page_id}"
            )));
        }
        let page = tx.get_page(page_id).await?.ok_or_else(|| {
            StoreError::Conflict(format!("chain of list {list_id} links to missing page {page_id}"))
        })?;
        if page.list_id != list_id.get() {
            return Err(StoreError::Conflict(format!(
                "chain of list {list_id} links to page {page_id} of list {}",
                page.list_id
            )));
        }
        let articles = tx.list_articles(page.id).await?;
        next = page.next_page_id;
        pages.push(PageView {
            page_id: PageId::from_stored(page.id),
            list_id,
            articles: articles.into_iter().map(Article::from).collect(),
            next_page_id: page.next_page_id.map(PageId::from_stored),
        });
    }

    Ok(pages)
}
