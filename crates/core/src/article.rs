//! Article records stored on pages.

use crate::ids::PageId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 512;

/// Maximum author length in characters.
pub const MAX_AUTHOR_LEN: usize = 256;

/// Maximum content length in bytes (256 KiB).
pub const MAX_CONTENT_BYTES: usize = 256 * 1024;

/// A validated article that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewArticle {
    title: String,
    author: String,
    content: String,
}

impl NewArticle {
    /// Create an article, validating required fields and size limits.
    ///
    /// Title and author are required (non-blank); content may be empty.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> crate::Result<Self> {
        let title = title.into();
        let author = author.into();
        let content = content.into();

        if title.trim().is_empty() {
            return Err(crate::Error::InvalidArticle(
                "title is required".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(crate::Error::InvalidArticle(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if author.trim().is_empty() {
            return Err(crate::Error::InvalidArticle(
                "author is required".to_string(),
            ));
        }
        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err(crate::Error::InvalidArticle(format!(
                "author exceeds {MAX_AUTHOR_LEN} characters"
            )));
        }
        if content.len() > MAX_CONTENT_BYTES {
            return Err(crate::Error::InvalidArticle(format!(
                "content exceeds {MAX_CONTENT_BYTES} bytes"
            )));
        }

        Ok(Self {
            title,
            author,
            content,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A stored article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub page_id: PageId,
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
