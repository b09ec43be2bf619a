//! Startup initialization of the bootstrap list.

use anyhow::{Context, Result};
use pagechain_core::List;
use pagechain_store::ChainManager;

/// Ensure the configured bootstrap list and its first page exist.
///
/// Returns `None` when bootstrapping is disabled in the index config.
pub async fn ensure_bootstrap_list(chain: &ChainManager) -> Result<Option<List>> {
    let config = chain.config();
    if !config.bootstrap_on_startup {
        tracing::info!("Bootstrap list creation disabled");
        return Ok(None);
    }

    let list = chain
        .bootstrap()
        .await
        .with_context(|| format!("failed to bootstrap list {}", config.bootstrap_list_id))?;

    if list.head_page_id.get() != config.first_page_id {
        // The list predates a change to index.first_page_id.
        tracing::warn!(
            list_id = %list.id,
            head_page_id = %list.head_page_id,
            expected = config.first_page_id,
            "Bootstrap list head differs from configured first page id"
        );
    }
    tracing::info!(list_id = %list.id, head_page_id = %list.head_page_id, "Bootstrap list ready");

    Ok(Some(list))
}
