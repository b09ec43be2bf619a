//! Transactional unit of work for chain mutations.

use crate::error::StoreResult;
use crate::models::{ArticleRow, ListRow, PageRow};
use async_trait::async_trait;
use pagechain_core::NewArticle;

/// An open transaction over the list, page, and article tables.
///
/// Dropping the transaction without calling [`ChainTx::commit`] rolls back
/// every write made through it.
#[async_trait]
pub trait ChainTx: Send {
    /// Serialize against other transactions touching the same list until
    /// this transaction ends.
    async fn lock_list(&mut self, list_id: i64) -> StoreResult<()>;

    async fn get_list(&mut self, list_id: i64) -> StoreResult<Option<ListRow>>;

    /// Insert a list whose head and tail are `head_page_id`.
    /// Returns `None` if a list with this id already exists.
    async fn insert_list(&mut self, list_id: i64, head_page_id: i64)
    -> StoreResult<Option<ListRow>>;

    async fn get_page(&mut self, page_id: i64) -> StoreResult<Option<PageRow>>;

    /// Same contract as [`PageRepo::create_page`](crate::repos::PageRepo::create_page).
    async fn insert_page(&mut self, list_id: i64, page_id: Option<i64>) -> StoreResult<PageRow>;

    async fn count_articles(&mut self, page_id: i64) -> StoreResult<i64>;

    /// Articles on a page in insertion order.
    async fn list_articles(&mut self, page_id: i64) -> StoreResult<Vec<ArticleRow>>;

    /// Same contract as [`PageRepo::set_successor`](crate::repos::PageRepo::set_successor).
    async fn set_successor(&mut self, page_id: i64, next_page_id: i64) -> StoreResult<()>;

    /// Compare-and-set the list's tail pointer. Fails with `Conflict` when the
    /// stored tail is not `expected`.
    async fn advance_tail(
        &mut self,
        list_id: i64,
        expected: Option<i64>,
        new_tail: i64,
    ) -> StoreResult<()>;

    async fn insert_article(&mut self, page_id: i64, article: &NewArticle)
    -> StoreResult<ArticleRow>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Opens chain transactions.
#[async_trait]
pub trait ChainRepo: Send + Sync {
    async fn begin_chain(&self) -> StoreResult<Box<dyn ChainTx>>;
}
