//! Database operations for the `scraped_articles` staging table.

use chrono::{DateTime, Utc};
use newsroom_core::{NewStagedArticle, StagedStats, StagedStatus};
use sqlx::PgPool;

use crate::DbError;

const STAGED_COLUMNS: &str = "id, source_id, title, content, excerpt, image_url, category, \
     original_url, published_at, status, created_at, approved_at, rejected_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `scraped_articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StagedArticleRow {
    pub id: i64,
    pub source_id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub category: String,
    pub original_url: String,
    pub published_at: DateTime<Utc>,
    /// One of `pending`, `approved`, `rejected` (enforced by a CHECK constraint).
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

impl StagedArticleRow {
    /// Parse the text `status` column, falling back to `Pending`.
    #[must_use]
    pub fn staged_status(&self) -> StagedStatus {
        self.status.parse().unwrap_or(StagedStatus::Pending)
    }
}

/// Optional filters for [`list_staged_articles`].
#[derive(Debug, Clone, Default)]
pub struct StagedFilter<'a> {
    pub status: Option<StagedStatus>,
    pub source_id: Option<&'a str>,
}

/// Result of a reject call that did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectOutcome {
    Rejected,
    AlreadyRejected,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Returns `true` if a staged row with this `original_url` already exists,
/// regardless of its status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn staged_url_exists(pool: &PgPool, original_url: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM scraped_articles WHERE original_url = $1)",
    )
    .bind(original_url)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Inserts a new `pending` row.
///
/// Returns `Some(id)` for a fresh row and `None` when the `original_url`
/// unique constraint already holds a row, in which case nothing is written.
/// The conflict path covers the race between [`staged_url_exists`] and the
/// insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any other database failure.
pub async fn insert_staged_article(
    pool: &PgPool,
    article: &NewStagedArticle,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scraped_articles \
             (source_id, title, content, excerpt, image_url, category, original_url, \
              published_at, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending') \
         ON CONFLICT (original_url) DO NOTHING \
         RETURNING id",
    )
    .bind(&article.source_id)
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.excerpt)
    .bind(article.image_url.as_deref())
    .bind(&article.category)
    .bind(&article.original_url)
    .bind(article.published_at)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Moves a `pending` row to `rejected` and stamps `rejected_at`.
///
/// Rejecting a row that is already `rejected` changes nothing and reports
/// [`RejectOutcome::AlreadyRejected`]. No published article is ever touched.
///
/// # Errors
///
/// - [`DbError::NotFound`] if no row has this id.
/// - [`DbError::InvalidTransition`] if the row is `approved`.
/// - [`DbError::Sqlx`] on query failure.
pub async fn reject_staged_article(pool: &PgPool, id: i64) -> Result<RejectOutcome, DbError> {
    let updated = sqlx::query(
        "UPDATE scraped_articles \
         SET status = 'rejected', rejected_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 1 {
        return Ok(RejectOutcome::Rejected);
    }

    let status =
        sqlx::query_scalar::<_, String>("SELECT status FROM scraped_articles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(DbError::NotFound)?;

    if status == StagedStatus::Rejected.as_str() {
        Ok(RejectOutcome::AlreadyRejected)
    } else {
        Err(DbError::InvalidTransition { id, status })
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches one staged row by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_staged_article(
    pool: &PgPool,
    id: i64,
) -> Result<Option<StagedArticleRow>, DbError> {
    let sql = format!("SELECT {STAGED_COLUMNS} FROM scraped_articles WHERE id = $1");
    let row = sqlx::query_as::<_, StagedArticleRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Lists staged rows newest first, optionally filtered by status and source.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_staged_articles(
    pool: &PgPool,
    filter: &StagedFilter<'_>,
    limit: i64,
) -> Result<Vec<StagedArticleRow>, DbError> {
    let sql = format!(
        "SELECT {STAGED_COLUMNS} FROM scraped_articles \
         WHERE ($1::text IS NULL OR status = $1) \
           AND ($2::text IS NULL OR source_id = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3"
    );
    let rows = sqlx::query_as::<_, StagedArticleRow>(&sql)
        .bind(filter.status.map(StagedStatus::as_str))
        .bind(filter.source_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Counts staged rows grouped by source and status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn staged_stats(pool: &PgPool) -> Result<StagedStats, DbError> {
    let groups = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT source_id, status, COUNT(*) \
         FROM scraped_articles \
         GROUP BY source_id, status",
    )
    .fetch_all(pool)
    .await?;

    let parsed = groups.into_iter().filter_map(|(source_id, status, count)| {
        match status.parse::<StagedStatus>() {
            Ok(status) => Some((source_id, status, count)),
            Err(e) => {
                tracing::warn!(
                    source_id = %source_id,
                    error = %e,
                    "skipping unknown staged status in stats"
                );
                None
            }
        }
    });

    Ok(StagedStats::from_groups(parsed))
}
