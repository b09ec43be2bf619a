//! Page endpoints: read and whole-page replacement.

use super::{ArticleInput, PageResponse};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use pagechain_core::{NewArticle, PageId};
use serde::Deserialize;

/// Replacement body: an array of articles, or a single article object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReplacePagePayload {
    Many(Vec<ArticleInput>),
    One(ArticleInput),
}

impl ReplacePagePayload {
    fn into_articles(self) -> Result<Vec<NewArticle>, ApiError> {
        let inputs = match self {
            Self::Many(inputs) => inputs,
            Self::One(input) => vec![input],
        };
        inputs
            .into_iter()
            .map(|input| NewArticle::try_from(input).map_err(ApiError::from))
            .collect()
    }
}

/// GET /v1/pages/{page_id} - A page's articles and its successor.
pub async fn get_page(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PageResponse>> {
    let Path(page_id) = path?;
    let page_id = PageId::parse(&page_id)?;

    let view = state.retrieval.get_page(page_id).await?;
    Ok(Json(view.into()))
}

/// PUT /v1/pages/{page_id} - Replace every article on the page.
pub async fn replace_page(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ReplacePagePayload>, JsonRejection>,
) -> ApiResult<Json<PageResponse>> {
    let Path(page_id) = path?;
    let page_id = PageId::parse(&page_id)?;
    let Json(payload) = payload?;
    let articles = payload.into_articles()?;

    let view = state
        .retrieval
        .replace_page_articles(page_id, articles)
        .await?;
    metrics::PAGES_REPLACED.inc();

    Ok(Json(view.into()))
}
