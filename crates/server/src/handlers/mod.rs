//! HTTP request handlers.

pub mod health;
pub mod lists;
pub mod pages;

pub use health::*;
pub use lists::*;
pub use pages::*;

use pagechain_core::{Article, NewArticle, PageView};
use serde::{Deserialize, Serialize};

/// Article as accepted in request bodies.
#[derive(Debug, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub content: String,
}

impl TryFrom<ArticleInput> for NewArticle {
    type Error = pagechain_core::Error;

    fn try_from(input: ArticleInput) -> Result<Self, Self::Error> {
        NewArticle::new(input.title, input.author, input.content)
    }
}

/// Article as returned on a page.
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            title: article.title,
            author: article.author,
            content: article.content,
        }
    }
}

/// One page of a chain.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page_id: i64,
    pub articles: Vec<ArticleResponse>,
    pub next_page_id: Option<i64>,
}

impl From<PageView> for PageResponse {
    fn from(view: PageView) -> Self {
        Self {
            page_id: view.page_id.get(),
            articles: view.articles.into_iter().map(ArticleResponse::from).collect(),
            next_page_id: view.next_page_id.map(|id| id.get()),
        }
    }
}
