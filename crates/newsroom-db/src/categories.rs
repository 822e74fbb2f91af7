//! Category lookup and seeding.

use chrono::{DateTime, Utc};
use newsroom_core::{canonical_categories, slugify, DEFAULT_CATEGORY};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Inserts every canonical category that is not present yet.
///
/// Returns the number of rows inserted. Safe to run repeatedly.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn seed_categories(pool: &PgPool) -> Result<u64, DbError> {
    let mut inserted = 0_u64;
    for name in canonical_categories() {
        let result = sqlx::query(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(slugify(name))
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Lists all categories ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, slug, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Resolves a category name to its id inside an open transaction.
///
/// An unknown name is created on the fly. If that insert collides on the
/// slug, the default category is used instead.
///
/// # Errors
///
/// - [`DbError::CategoryUnavailable`] if neither `name` nor the default
///   category can be resolved.
/// - [`DbError::Sqlx`] on query failure.
pub async fn resolve_category_id(conn: &mut PgConnection, name: &str) -> Result<i64, DbError> {
    if let Some(id) = find_category_id(conn, name).await? {
        return Ok(id);
    }

    let created = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, slug) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING \
         RETURNING id",
    )
    .bind(name)
    .bind(slugify(name))
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = created {
        return Ok(id);
    }

    tracing::debug!(category = name, "category slug taken, using default");
    find_category_id(conn, DEFAULT_CATEGORY)
        .await?
        .ok_or_else(|| DbError::CategoryUnavailable(name.to_owned()))
}

async fn find_category_id(conn: &mut PgConnection, name: &str) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}
