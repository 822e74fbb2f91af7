//! Moderation transitions over staged articles.
//!
//! `pending` is the only state that accepts a transition. Approving a row
//! promotes it into the published store; rejecting it only flips the status.

use newsroom_core::{slugify, NewPublishedArticle, StagedStats, StagedStatus, DEFAULT_CATEGORY};
use newsroom_db::{PublishedArticleRow, RejectOutcome, StagedArticleRow};

use crate::error::IngestError;
use crate::store::ArticleStore;

/// Build the published copy of a staged row.
///
/// Titles that slugify to nothing (all punctuation) fall back to
/// `articulo-{id}`.
#[must_use]
pub fn draft_from_staged(row: &StagedArticleRow, author: &str) -> NewPublishedArticle {
    let mut slug = slugify(&row.title);
    if slug.is_empty() {
        slug = format!("articulo-{}", row.id);
    }

    let category_name = if row.category.trim().is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        row.category.clone()
    };

    NewPublishedArticle {
        staged_id: row.id,
        title: row.title.clone(),
        slug,
        excerpt: row.excerpt.clone(),
        content: row.content.clone(),
        image_url: row.image_url.clone(),
        category_name,
        author: author.to_string(),
    }
}

/// Approve a `pending` staged article, creating exactly one published article.
///
/// # Errors
///
/// - [`IngestError::NotFound`] if no staged row has this id.
/// - [`IngestError::InvalidTransition`] if the row is already approved or
///   rejected; nothing is written.
/// - [`IngestError::Store`] on persistence failure; nothing is written.
pub async fn approve<S>(
    store: &S,
    id: i64,
    author: &str,
) -> Result<PublishedArticleRow, IngestError>
where
    S: ArticleStore + ?Sized,
{
    let row = store
        .get_staged(id)
        .await?
        .ok_or(IngestError::NotFound(id))?;

    let status = row.staged_status();
    if status != StagedStatus::Pending {
        return Err(IngestError::InvalidTransition {
            id,
            status: status.to_string(),
        });
    }

    let draft = draft_from_staged(&row, author);
    let article = store
        .promote(&draft)
        .await
        .map_err(|e| IngestError::from_store(id, e))?;

    tracing::info!(
        staged_id = id,
        article_id = article.id,
        slug = %article.slug,
        "staged article approved"
    );
    Ok(article)
}

/// Reject a staged article. Rejecting an already-rejected row is a no-op.
///
/// # Errors
///
/// - [`IngestError::NotFound`] if no staged row has this id.
/// - [`IngestError::InvalidTransition`] if the row was approved.
/// - [`IngestError::Store`] on persistence failure.
pub async fn reject<S>(store: &S, id: i64) -> Result<RejectOutcome, IngestError>
where
    S: ArticleStore + ?Sized,
{
    let outcome = store
        .reject(id)
        .await
        .map_err(|e| IngestError::from_store(id, e))?;

    match outcome {
        RejectOutcome::Rejected => tracing::info!(staged_id = id, "staged article rejected"),
        RejectOutcome::AlreadyRejected => {
            tracing::debug!(staged_id = id, "staged article was already rejected");
        }
    }
    Ok(outcome)
}

/// Counts of staged rows by status and by source.
///
/// # Errors
///
/// Returns [`IngestError::Store`] on persistence failure.
pub async fn stats<S>(store: &S) -> Result<StagedStats, IngestError>
where
    S: ArticleStore + ?Sized,
{
    Ok(store.stats().await?)
}
