//! Chain services built on top of an [`IndexStore`](crate::IndexStore).
//!
//! Every mutation of one list runs under that list's in-process lock and
//! inside the configured operation timeout. Lock acquisition counts against
//! the timeout.

mod chain;
mod deletion;
mod locks;
mod retrieval;

pub use chain::ChainManager;
pub use deletion::DeletionService;
pub use locks::ListLocks;
pub use retrieval::RetrievalService;

use crate::error::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;

/// Run `fut` with an upper bound on its duration.
///
/// Dropping the future rolls back any open transaction it holds.
pub(crate) async fn with_timeout<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation, timeout_ms, "Index operation timed out");
            Err(StoreError::Timeout {
                operation,
                timeout_ms,
            })
        }
    }
}
