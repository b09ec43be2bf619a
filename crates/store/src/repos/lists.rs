//! List registry repository trait.

use crate::error::StoreResult;
use crate::models::{CascadeDeleteStats, ListRow};
use async_trait::async_trait;

/// Repository for list rows.
///
/// Lists are created through [`ChainTx`](crate::repos::ChainTx) so that the
/// list row and its first page are written in one transaction.
#[async_trait]
pub trait ListRepo: Send + Sync {
    /// Get a list by ID.
    async fn get_list(&self, list_id: i64) -> StoreResult<Option<ListRow>>;

    /// Get the head pointer of a list. Fails with `NotFound` for an unknown list.
    async fn get_head_pointer(&self, list_id: i64) -> StoreResult<i64>;

    /// List all lists in id order.
    async fn list_lists(&self) -> StoreResult<Vec<ListRow>>;

    /// Delete every article and page of a list atomically and clear its tail
    /// pointer. The list row itself is kept.
    async fn delete_list_with_cascade(&self, list_id: i64) -> StoreResult<CascadeDeleteStats>;
}
