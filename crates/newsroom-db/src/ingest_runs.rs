//! Database operations for `ingest_runs` and `ingest_run_sources`.
//!
//! A run row is created in `running` state when a pass over the source
//! registry starts, one `ingest_run_sources` row is written per source as it
//! finishes, and the run is closed as `succeeded` or `failed` at the end.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `ingest_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `scheduler`, `api` or `cli`.
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_extracted: i32,
    pub total_saved: i32,
    pub error_message: Option<String>,
}

/// A row from the `ingest_run_sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunSourceRow {
    pub id: i64,
    pub run_id: i64,
    pub source_id: String,
    pub status: String,
    pub extracted: i32,
    pub saved: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     total_extracted, total_saved, error_message";

// ---------------------------------------------------------------------------
// ingest_runs operations
// ---------------------------------------------------------------------------

/// Creates a run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingest_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let sql = format!(
        "INSERT INTO ingest_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'running') \
         RETURNING {RUN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, IngestRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(trigger_source)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Closes a `running` run as `succeeded` with its totals.
///
/// # Errors
///
/// - [`DbError::NotFound`] if no `running` run has this id.
/// - [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingest_run(
    pool: &PgPool,
    id: i64,
    total_extracted: i32,
    total_saved: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             total_extracted = $1, total_saved = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(total_extracted)
    .bind(total_saved)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Closes a `running` run as `failed`, keeping whatever totals were reached.
///
/// # Errors
///
/// - [`DbError::NotFound`] if no `running` run has this id.
/// - [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingest_run(
    pool: &PgPool,
    id: i64,
    total_extracted: i32,
    total_saved: i32,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'failed', completed_at = NOW(), \
             total_extracted = $1, total_saved = $2, error_message = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(total_extracted)
    .bind(total_saved)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Lists the most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_ingest_runs(pool: &PgPool, limit: i64) -> Result<Vec<IngestRunRow>, DbError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM ingest_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, IngestRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// ingest_run_sources operations
// ---------------------------------------------------------------------------

/// Records the outcome of one source within a run.
///
/// Writing the same `(run_id, source_id)` twice overwrites the earlier row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn insert_ingest_run_source(
    pool: &PgPool,
    run_id: i64,
    source_id: &str,
    extracted: i32,
    saved: i32,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let status = if error_message.is_some() {
        "failed"
    } else {
        "succeeded"
    };

    sqlx::query(
        "INSERT INTO ingest_run_sources \
             (run_id, source_id, status, extracted, saved, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (run_id, source_id) DO UPDATE \
         SET status = EXCLUDED.status, \
             extracted = EXCLUDED.extracted, \
             saved = EXCLUDED.saved, \
             error_message = EXCLUDED.error_message",
    )
    .bind(run_id)
    .bind(source_id)
    .bind(status)
    .bind(extracted)
    .bind(saved)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lists per-source rows for one run in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_ingest_run_sources(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<IngestRunSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunSourceRow>(
        "SELECT id, run_id, source_id, status, extracted, saved, error_message, created_at \
         FROM ingest_run_sources \
         WHERE run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
