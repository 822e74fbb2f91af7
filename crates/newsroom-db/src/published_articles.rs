//! Promotion of staged rows into the `articles` table.

use chrono::{DateTime, Utc};
use newsroom_core::{slug_candidate, NewPublishedArticle, StagedStatus};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::categories::resolve_category_id;
use crate::DbError;

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PublishedArticleRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: i64,
    pub author: String,
    pub status: String,
    pub source_staged_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const PUBLISHED_COLUMNS: &str = "id, public_id, title, slug, excerpt, content, image_url, \
     category_id, author, status, source_staged_id, published_at, created_at";

/// Creates the published article for a `pending` staged row and marks the row
/// `approved`, all in one transaction.
///
/// The staged row is locked with `FOR UPDATE` so two concurrent approvals of
/// the same id serialize; the loser sees `approved` and fails. If the base
/// slug is taken, `-{staged_id}` is appended, then a counter after that,
/// until a free slug is found.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the staged row does not exist.
/// - [`DbError::InvalidTransition`] if the staged row is not `pending`.
/// - [`DbError::CategoryUnavailable`] if no category can be attached.
/// - [`DbError::Sqlx`] on query failure; the transaction is rolled back.
pub async fn promote_staged_article(
    pool: &PgPool,
    draft: &NewPublishedArticle,
) -> Result<PublishedArticleRow, DbError> {
    let mut tx = pool.begin().await?;

    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM scraped_articles WHERE id = $1 FOR UPDATE",
    )
    .bind(draft.staged_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(DbError::NotFound)?;

    if status != StagedStatus::Pending.as_str() {
        return Err(DbError::InvalidTransition {
            id: draft.staged_id,
            status,
        });
    }

    let category_id = resolve_category_id(&mut tx, &draft.category_name).await?;
    let slug = unique_slug(&mut tx, &draft.slug, draft.staged_id).await?;

    let sql = format!(
        "INSERT INTO articles \
             (public_id, title, slug, excerpt, content, image_url, category_id, author, \
              status, source_staged_id, published_at, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'published', $9, NOW(), NOW(), NOW()) \
         RETURNING {PUBLISHED_COLUMNS}"
    );
    let row = sqlx::query_as::<_, PublishedArticleRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(&draft.title)
        .bind(&slug)
        .bind(&draft.excerpt)
        .bind(&draft.content)
        .bind(draft.image_url.as_deref())
        .bind(category_id)
        .bind(&draft.author)
        .bind(draft.staged_id)
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE scraped_articles \
         SET status = 'approved', approved_at = NOW() \
         WHERE id = $1",
    )
    .bind(draft.staged_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}

/// Fetches the published article created from a staged row, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_published_by_staged_id(
    pool: &PgPool,
    staged_id: i64,
) -> Result<Option<PublishedArticleRow>, DbError> {
    let sql = format!("SELECT {PUBLISHED_COLUMNS} FROM articles WHERE source_staged_id = $1");
    let row = sqlx::query_as::<_, PublishedArticleRow>(&sql)
        .bind(staged_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

async fn unique_slug(
    conn: &mut PgConnection,
    base: &str,
    staged_id: i64,
) -> Result<String, DbError> {
    let mut attempt = 0;
    loop {
        let slug = slug_candidate(base, staged_id, attempt);
        let taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM articles WHERE slug = $1)")
                .bind(&slug)
                .fetch_one(&mut *conn)
                .await?;
        if !taken {
            return Ok(slug);
        }
        tracing::debug!(slug = %slug, staged_id, "slug taken, trying next");
        attempt += 1;
    }
}
