//! Persistence seam for the pipeline and moderation flows.
//!
//! [`PgArticleStore`] is the production implementation; [`MemoryArticleStore`]
//! backs dry runs and tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use newsroom_core::{NewPublishedArticle, NewStagedArticle, StagedStats};
use newsroom_db::{DbError, PublishedArticleRow, RejectOutcome, StagedArticleRow, StagedFilter};

use crate::pipeline::{RunSummary, SourceRunResult};

pub use memory::{MemoryArticleStore, MemoryRun};
pub use postgres::PgArticleStore;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Whether any staged row, in any status, already has this URL.
    async fn url_exists(&self, original_url: &str) -> Result<bool, DbError>;

    /// Insert a `pending` row. `Ok(None)` means the URL was already present
    /// and nothing was written.
    async fn insert_staged(&self, article: &NewStagedArticle) -> Result<Option<i64>, DbError>;

    async fn get_staged(&self, id: i64) -> Result<Option<StagedArticleRow>, DbError>;

    async fn list_staged(
        &self,
        filter: &StagedFilter<'_>,
        limit: i64,
    ) -> Result<Vec<StagedArticleRow>, DbError>;

    /// Create the published article and mark the staged row `approved` as one
    /// atomic unit.
    async fn promote(&self, draft: &NewPublishedArticle) -> Result<PublishedArticleRow, DbError>;

    async fn reject(&self, id: i64) -> Result<RejectOutcome, DbError>;

    async fn stats(&self) -> Result<StagedStats, DbError>;

    // Run history. Callers treat failures here as non-fatal.

    async fn begin_run(&self, trigger: &str) -> Result<i64, DbError>;

    async fn record_source(&self, run_id: i64, result: &SourceRunResult) -> Result<(), DbError>;

    async fn finish_run(
        &self,
        run_id: i64,
        summary: &RunSummary,
        error: Option<&str>,
    ) -> Result<(), DbError>;
}
