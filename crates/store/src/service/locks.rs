//! Per-list mutual exclusion within one process.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-list async mutexes.
///
/// Mutations of different lists never contend; mutations of the same list
/// run one at a time in lock acquisition order.
#[derive(Default)]
pub struct ListLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl ListLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `list_id`. Access ends when the guard drops.
    pub async fn acquire(&self, list_id: i64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(list_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            tracing::debug!(removed, "Pruned idle list locks");
        }
        removed
    }

    /// Number of tracked lists.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
