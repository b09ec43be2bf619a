//! Database rows mapping to the index schema.

use pagechain_core::{Article, List, ListId, PageId};
use sqlx::FromRow;
use time::OffsetDateTime;

/// List record.
#[derive(Debug, Clone, FromRow)]
pub struct ListRow {
    pub id: i64,
    /// First page ever created for the list. Never updated.
    pub head_pointer: i64,
    /// Current tail, NULL after the list's pages were deleted.
    pub tail_page_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Page record.
#[derive(Debug, Clone, FromRow)]
pub struct PageRow {
    pub id: i64,
    pub list_id: i64,
    pub next_page_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Article record.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub page_id: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Rows removed by a list cascade delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeDeleteStats {
    pub pages: u64,
    pub articles: u64,
}

impl From<ListRow> for List {
    fn from(row: ListRow) -> Self {
        Self {
            id: ListId::from_stored(row.id),
            head_page_id: PageId::from_stored(row.head_pointer),
            tail_page_id: row.tail_page_id.map(PageId::from_stored),
        }
    }
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            page_id: PageId::from_stored(row.page_id),
            title: row.title,
            author: row.author,
            content: row.content,
            created_at: row.created_at,
        }
    }
}
