//! Record store repository trait.

use crate::error::{StoreError, StoreResult};
use crate::models::{ArticleRow, PageRow};
use async_trait::async_trait;
use pagechain_core::NewArticle;

/// Repository for article rows.
#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Count the articles on a page.
    async fn count_by_page(&self, page_id: i64) -> StoreResult<i64>;

    /// Articles on a page in insertion order.
    async fn list_by_page(&self, page_id: i64) -> StoreResult<Vec<ArticleRow>>;

    /// Insert an article on an existing page without applying the capacity policy.
    async fn create_article(&self, page_id: i64, article: &NewArticle)
    -> StoreResult<ArticleRow>;

    /// Delete all articles on a page. Returns the number deleted.
    async fn delete_by_page(&self, page_id: i64) -> StoreResult<u64>;

    /// Delete all articles on the given pages. Returns the number deleted.
    async fn delete_by_page_ids(&self, page_ids: &[i64]) -> StoreResult<u64>;

    /// Atomically replace every article on a page.
    ///
    /// An open (tail) page may hold up to `capacity` articles; a closed page
    /// must be given exactly `capacity` so every closed page stays full.
    async fn replace_page_articles(
        &self,
        page_id: i64,
        articles: &[NewArticle],
        capacity: u32,
    ) -> StoreResult<Vec<ArticleRow>>;
}

/// Check a replacement article set against the page's capacity rule.
pub(crate) fn check_replacement(page: &PageRow, count: usize, capacity: u32) -> StoreResult<()> {
    let capacity = capacity as usize;
    if page.next_page_id.is_none() {
        if count > capacity {
            return Err(StoreError::Validation(format!(
                "page {} holds at most {capacity} articles, got {count}",
                page.id
            )));
        }
    } else if count != capacity {
        return Err(StoreError::Validation(format!(
            "page {} is closed and must hold exactly {capacity} articles, got {count}",
            page.id
        )));
    }
    Ok(())
}
