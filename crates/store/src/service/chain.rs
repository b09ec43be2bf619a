//! List bootstrap and article append.

use super::{ListLocks, with_timeout};
use crate::error::{StoreError, StoreResult};
use crate::models::ListRow;
use crate::repos::ChainTx;
use crate::store::IndexStore;
use pagechain_core::config::IndexConfig;
use pagechain_core::{List, ListId, NewArticle, PageId, PageRef};
use std::sync::Arc;

/// Owns every mutation that grows a page chain.
pub struct ChainManager {
    store: Arc<dyn IndexStore>,
    locks: Arc<ListLocks>,
    config: IndexConfig,
}

impl ChainManager {
    pub fn new(store: Arc<dyn IndexStore>, locks: Arc<ListLocks>, config: IndexConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    /// Articles per page.
    pub fn capacity(&self) -> u32 {
        self.config.page_capacity
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Ensure the configured bootstrap list exists.
    pub async fn bootstrap(&self) -> StoreResult<List> {
        let list_id = ListId::new(self.config.bootstrap_list_id)?;
        self.ensure_list(list_id).await
    }

    /// Return the list, creating it and its first page if it does not exist.
    ///
    /// Idempotent: concurrent and repeated calls observe exactly one list row
    /// and one first page.
    pub async fn ensure_list(&self, list_id: ListId) -> StoreResult<List> {
        let (list, _) = self.ensure_list_created(list_id).await?;
        Ok(list)
    }

    /// Like [`Self::ensure_list`], also reporting whether this call created
    /// the list and its first page.
    pub async fn ensure_list_created(&self, list_id: ListId) -> StoreResult<(List, bool)> {
        with_timeout(self.config.operation_timeout(), "ensure_list", async {
            let _guard = self.locks.acquire(list_id.get()).await;

            if let Some(row) = self.store.get_list(list_id.get()).await? {
                return Ok((List::from(row), false));
            }

            let mut attempt = 0;
            loop {
                let mut tx = self.store.begin_chain().await?;
                match self.bootstrap_in(tx.as_mut(), list_id.get()).await {
                    Ok((row, created)) => {
                        tx.commit().await?;
                        return Ok((List::from(row), created));
                    }
                    Err(e) if e.is_conflict() && attempt < self.config.append_retries => {
                        drop(tx);
                        attempt += 1;
                        tracing::warn!(list_id = %list_id, attempt, error = %e, "List creation conflicted, retrying");
                        if let Some(row) = self.store.get_list(list_id.get()).await? {
                            return Ok((List::from(row), false));
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await
    }

    /// Append an article to the list's tail page, extending the chain with a
    /// new page when the tail is full. Creates the list if it does not exist.
    ///
    /// Either the article, any new page, the successor link, and the tail
    /// move all become visible, or none of them do. A chain conflict is
    /// retried up to `append_retries` times.
    pub async fn append(&self, list_id: ListId, article: NewArticle) -> StoreResult<PageRef> {
        with_timeout(self.config.operation_timeout(), "append", async {
            let _guard = self.locks.acquire(list_id.get()).await;

            let mut attempt = 0;
            loop {
                match self.try_append(list_id.get(), &article).await {
                    Ok(page_ref) => return Ok(page_ref),
                    Err(e) if e.is_conflict() && attempt < self.config.append_retries => {
                        attempt += 1;
                        tracing::warn!(list_id = %list_id, attempt, error = %e, "Append conflicted, retrying");
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await
    }

    async fn try_append(&self, list_id: i64, article: &NewArticle) -> StoreResult<PageRef> {
        let capacity = i64::from(self.config.page_capacity);
        let mut tx = self.store.begin_chain().await?;
        let (list, mut created_page) = self.bootstrap_in(tx.as_mut(), list_id).await?;

        let tail_id = match list.tail_page_id {
            Some(tail_id) => tail_id,
            None => {
                // The list's pages were deleted. Rebuild the chain from the
                // same head id so the head marker stays valid.
                let head = tx.insert_page(list_id, Some(list.head_pointer)).await?;
                tx.advance_tail(list_id, None, head.id).await?;
                created_page = true;
                tracing::info!(list_id, page_id = head.id, "Head page re-created");
                head.id
            }
        };

        let tail = tx.get_page(tail_id).await?.ok_or_else(|| {
            StoreError::Internal(format!("tail page {tail_id} of list {list_id} is missing"))
        })?;
        if tail.list_id != list_id {
            return Err(StoreError::Conflict(format!(
                "tail page {tail_id} of list {list_id} belongs to list {}",
                tail.list_id
            )));
        }
        if tail.next_page_id.is_some() {
            return Err(StoreError::Conflict(format!(
                "tail page {tail_id} of list {list_id} already has a successor"
            )));
        }

        let count = tx.count_articles(tail.id).await?;
        let target = if count >= capacity {
            let page = tx.insert_page(list_id, None).await?;
            tx.set_successor(tail.id, page.id).await?;
            tx.advance_tail(list_id, Some(tail.id), page.id).await?;
            created_page = true;
            tracing::debug!(list_id, previous = tail.id, page_id = page.id, "Chain extended");
            page.id
        } else {
            tail.id
        };

        let row = tx.insert_article(target, article).await?;
        tx.commit().await?;

        tracing::debug!(
            list_id,
            page_id = target,
            article_id = row.id,
            created_page,
            "Article appended"
        );

        Ok(PageRef {
            list_id: ListId::from_stored(list_id),
            page_id: PageId::from_stored(target),
            article_id: row.id,
            created_page,
        })
    }

    /// Lock the list inside `tx` and return it, creating the list row and
    /// its first page when missing. The flag is true if the list was created.
    async fn bootstrap_in(
        &self,
        tx: &mut dyn ChainTx,
        list_id: i64,
    ) -> StoreResult<(ListRow, bool)> {
        tx.lock_list(list_id).await?;
        if let Some(row) = tx.get_list(list_id).await? {
            return Ok((row, false));
        }

        // Only the bootstrap list gets the fixed first page id. If another
        // list already holds that id the insert fails with Conflict.
        let fixed =
            (list_id == self.config.bootstrap_list_id).then_some(self.config.first_page_id);

        let page = tx.insert_page(list_id, fixed).await?;
        let row = tx.insert_list(list_id, page.id).await?.ok_or_else(|| {
            StoreError::Conflict(format!("list {list_id} was created concurrently"))
        })?;

        tracing::info!(list_id, head_page_id = page.id, "List created");
        Ok((row, true))
    }
}
