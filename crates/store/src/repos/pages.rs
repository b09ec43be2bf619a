//! Page store repository trait.

use crate::error::StoreResult;
use crate::models::PageRow;
use async_trait::async_trait;

/// Repository for page rows.
#[async_trait]
pub trait PageRepo: Send + Sync {
    /// Get a page by ID.
    async fn get_page(&self, page_id: i64) -> StoreResult<Option<PageRow>>;

    /// Create a page with no successor. `page_id` of `None` takes the next id
    /// from the page sequence; a fixed id that is already taken is a `Conflict`.
    async fn create_page(&self, list_id: i64, page_id: Option<i64>) -> StoreResult<PageRow>;

    /// Link `page_id` to its successor. The link can be set only once:
    /// overwriting fails with `Conflict`, an unknown page with `NotFound`.
    async fn set_successor(&self, page_id: i64, next_page_id: i64) -> StoreResult<()>;

    /// Resolve the tail through the list's tail pointer.
    async fn find_tail(&self, list_id: i64) -> StoreResult<Option<PageRow>>;

    /// The page with the largest id in the list.
    async fn find_last_page(&self, list_id: i64) -> StoreResult<Option<PageRow>>;

    /// All pages of a list in id order.
    async fn list_pages(&self, list_id: i64) -> StoreResult<Vec<PageRow>>;
}
