//! List endpoints: bootstrap, head lookup, append, chain walk, delete.

use super::{ArticleInput, PageResponse};
use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use pagechain_core::{List, ListId, NewArticle, PageRef};
use serde::Serialize;
use std::time::Instant;

/// List response.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub list_id: i64,
    pub head_page_id: i64,
    pub tail_page_id: Option<i64>,
}

impl From<List> for ListResponse {
    fn from(list: List) -> Self {
        Self {
            list_id: list.id.get(),
            head_page_id: list.head_page_id.get(),
            tail_page_id: list.tail_page_id.map(|id| id.get()),
        }
    }
}

/// Head marker response.
#[derive(Debug, Serialize)]
pub struct HeadResponse {
    pub next_page_id: i64,
}

/// Where an appended article landed.
#[derive(Debug, Serialize)]
pub struct AppendResponse {
    pub list_id: i64,
    pub page_id: i64,
    pub article_id: i64,
    pub created_page: bool,
}

impl From<PageRef> for AppendResponse {
    fn from(page_ref: PageRef) -> Self {
        Self {
            list_id: page_ref.list_id.get(),
            page_id: page_ref.page_id.get(),
            article_id: page_ref.article_id,
            created_page: page_ref.created_page,
        }
    }
}

/// Chain walk response.
#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub list_id: i64,
    pub pages: Vec<PageResponse>,
}

/// Cascade delete response.
#[derive(Debug, Serialize)]
pub struct DeleteListResponse {
    pub list_id: i64,
    pub pages_deleted: u64,
    pub articles_deleted: u64,
}

/// PUT /v1/lists/{list_id} - Create the list if it does not exist.
pub async fn ensure_list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Path(list_id) = path?;
    let list_id = ListId::parse(&list_id)?;

    let (list, created) = state.chain.ensure_list_created(list_id).await?;
    if created {
        metrics::PAGES_CREATED.inc();
    }
    Ok(Json(list.into()))
}

/// GET /v1/lists/{list_id} - The list's head page id.
pub async fn get_list_head(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<HeadResponse>> {
    let Path(list_id) = path?;
    let list_id = ListId::parse(&list_id)?;

    let head = state.retrieval.get_head(list_id).await?;
    Ok(Json(HeadResponse {
        next_page_id: head.next_page_id.get(),
    }))
}

/// POST /v1/lists/{list_id}/articles - Append an article to the list.
pub async fn append_article(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ArticleInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AppendResponse>)> {
    let Path(list_id) = path?;
    let list_id = ListId::parse(&list_id)?;
    let Json(input) = payload?;
    let article = NewArticle::try_from(input)?;

    let started = Instant::now();
    let page_ref = state.chain.append(list_id, article).await?;
    metrics::APPEND_DURATION.observe(started.elapsed().as_secs_f64());
    metrics::ARTICLES_APPENDED.inc();
    if page_ref.created_page {
        metrics::PAGES_CREATED.inc();
    }

    Ok((StatusCode::CREATED, Json(page_ref.into())))
}

/// GET /v1/lists/{list_id}/pages - Every page from head to tail.
pub async fn list_chain(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ChainResponse>> {
    let Path(list_id) = path?;
    let list_id = ListId::parse(&list_id)?;

    let pages = state.retrieval.walk_chain(list_id).await?;
    Ok(Json(ChainResponse {
        list_id: list_id.get(),
        pages: pages.into_iter().map(PageResponse::from).collect(),
    }))
}

/// DELETE /v1/lists/{list_id} - Delete every page and article of the list.
pub async fn delete_list(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<DeleteListResponse>> {
    let Path(list_id) = path?;
    let list_id = ListId::parse(&list_id)?;

    let stats = state.deletion.delete_list(list_id).await?;
    metrics::LISTS_DELETED.inc();
    metrics::ARTICLES_DELETED.inc_by(stats.articles);

    Ok(Json(DeleteListResponse {
        list_id: list_id.get(),
        pages_deleted: stats.pages,
        articles_deleted: stats.articles,
    }))
}
