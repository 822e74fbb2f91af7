use axum::{
    extract::{Query, State},
    Extension, Json,
};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsroom_ingest::{ArticleStore, IngestError, Pipeline, RunSummary, RunTrigger};
use newsroom_scraper::{Extractor, Fetcher};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, map_ingest_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct IngestRunItem {
    ingest_run_id: Uuid,
    trigger_source: String,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    total_extracted: i32,
    total_saved: i32,
    error_message: Option<String>,
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<IngestRunItem>>>, ApiError> {
    let rows = newsroom_db::list_ingest_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| IngestRunItem {
            ingest_run_id: row.public_id,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_extracted: row.total_extracted,
            total_saved: row.total_saved,
            error_message: row.error_message,
        })
        .collect();

    Ok(ApiResponse::new(data, req_id.0))
}

/// Starts a run on its own task so it finishes even if the caller goes away.
pub(super) fn spawn_run<F, E, S>(
    pipeline: Arc<Pipeline<F, E, S>>,
    trigger: RunTrigger,
) -> tokio::task::JoinHandle<Result<RunSummary, IngestError>>
where
    F: Fetcher + 'static,
    E: Extractor + 'static,
    S: ArticleStore + 'static,
{
    tokio::spawn(async move { pipeline.run_all(trigger).await })
}

/// Runs the pipeline to completion and returns its summary.
///
/// A client disconnect drops this handler but not the spawned run.
pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RunSummary>>, ApiError> {
    let summary = spawn_run(Arc::clone(&state.pipeline), RunTrigger::Api)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "ingest task aborted");
            ApiError::new(req_id.0.clone(), "internal_error", "ingest task aborted")
        })?
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(summary, req_id.0))
}
