//! Lists, pages, and the views returned to callers.

use crate::article::Article;
use crate::ids::{ListId, PageId};
use serde::{Deserialize, Serialize};

/// A list: the root of one page chain.
///
/// `head_page_id` is fixed when the list is created. `tail_page_id` moves
/// forward each time the chain is extended and is `None` after the list's
/// pages were deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub head_page_id: PageId,
    pub tail_page_id: Option<PageId>,
}

/// Where an appended article landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub list_id: ListId,
    pub page_id: PageId,
    /// Article id assigned by the store.
    pub article_id: i64,
    /// True when the append created a page (chain extension or first page).
    pub created_page: bool,
}

/// A page together with its articles, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub page_id: PageId,
    pub list_id: ListId,
    pub articles: Vec<Article>,
    pub next_page_id: Option<PageId>,
}

/// The externally visible head marker of a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListHead {
    pub list_id: ListId,
    pub next_page_id: PageId,
}
