use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use newsroom_core::{StagedStats, StagedStatus};
use newsroom_db::{RejectOutcome, StagedArticleRow, StagedFilter};
use newsroom_ingest::ArticleStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, map_ingest_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct StagedQuery {
    pub status: Option<String>,
    pub source: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct StagedItem {
    id: i64,
    source_id: String,
    title: String,
    excerpt: String,
    image_url: Option<String>,
    category: String,
    original_url: String,
    status: String,
    published_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
}

impl From<StagedArticleRow> for StagedItem {
    fn from(row: StagedArticleRow) -> Self {
        Self {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            excerpt: row.excerpt,
            image_url: row.image_url,
            category: row.category,
            original_url: row.original_url,
            status: row.status,
            published_at: row.published_at,
            created_at: row.created_at,
            approved_at: row.approved_at,
            rejected_at: row.rejected_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ApprovedItem {
    staged_id: i64,
    published_article_id: i64,
    public_id: Uuid,
    slug: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RejectedItem {
    id: i64,
    status: &'static str,
    changed: bool,
}

pub(super) async fn list_staged(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<StagedQuery>,
) -> Result<Json<ApiResponse<Vec<StagedItem>>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<StagedStatus>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?;

    let filter = StagedFilter {
        status,
        source_id: query.source.as_deref(),
    };
    let rows = state
        .pipeline
        .store()
        .list_staged(&filter, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(StagedItem::from).collect();
    Ok(ApiResponse::new(data, req_id.0))
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StagedStats>>, ApiError> {
    let stats = newsroom_ingest::stats(state.pipeline.store())
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(stats, req_id.0))
}

pub(super) async fn approve(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ApprovedItem>>, ApiError> {
    let article = newsroom_ingest::approve(state.pipeline.store(), id, &state.default_author)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    let data = ApprovedItem {
        staged_id: id,
        published_article_id: article.id,
        public_id: article.public_id,
        slug: article.slug,
    };
    Ok(ApiResponse::new(data, req_id.0))
}

pub(super) async fn reject(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RejectedItem>>, ApiError> {
    let outcome = newsroom_ingest::reject(state.pipeline.store(), id)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    let data = RejectedItem {
        id,
        status: StagedStatus::Rejected.as_str(),
        changed: outcome == RejectOutcome::Rejected,
    };
    Ok(ApiResponse::new(data, req_id.0))
}
