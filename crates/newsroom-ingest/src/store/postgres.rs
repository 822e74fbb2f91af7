use async_trait::async_trait;
use newsroom_core::{NewPublishedArticle, NewStagedArticle, StagedStats};
use newsroom_db::{DbError, PublishedArticleRow, RejectOutcome, StagedArticleRow, StagedFilter};
use sqlx::PgPool;

use super::ArticleStore;
use crate::pipeline::{RunSummary, SourceRunResult};

/// [`ArticleStore`] over the `newsroom-db` query functions.
#[derive(Debug, Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn clamp_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn url_exists(&self, original_url: &str) -> Result<bool, DbError> {
        newsroom_db::staged_url_exists(&self.pool, original_url).await
    }

    async fn insert_staged(&self, article: &NewStagedArticle) -> Result<Option<i64>, DbError> {
        newsroom_db::insert_staged_article(&self.pool, article).await
    }

    async fn get_staged(&self, id: i64) -> Result<Option<StagedArticleRow>, DbError> {
        newsroom_db::get_staged_article(&self.pool, id).await
    }

    async fn list_staged(
        &self,
        filter: &StagedFilter<'_>,
        limit: i64,
    ) -> Result<Vec<StagedArticleRow>, DbError> {
        newsroom_db::list_staged_articles(&self.pool, filter, limit).await
    }

    async fn promote(&self, draft: &NewPublishedArticle) -> Result<PublishedArticleRow, DbError> {
        newsroom_db::promote_staged_article(&self.pool, draft).await
    }

    async fn reject(&self, id: i64) -> Result<RejectOutcome, DbError> {
        newsroom_db::reject_staged_article(&self.pool, id).await
    }

    async fn stats(&self) -> Result<StagedStats, DbError> {
        newsroom_db::staged_stats(&self.pool).await
    }

    async fn begin_run(&self, trigger: &str) -> Result<i64, DbError> {
        let run = newsroom_db::create_ingest_run(&self.pool, trigger).await?;
        Ok(run.id)
    }

    async fn record_source(&self, run_id: i64, result: &SourceRunResult) -> Result<(), DbError> {
        newsroom_db::insert_ingest_run_source(
            &self.pool,
            run_id,
            &result.source_id,
            clamp_i32(result.extracted),
            clamp_i32(result.saved),
            result.error.as_deref(),
        )
        .await
    }

    async fn finish_run(
        &self,
        run_id: i64,
        summary: &RunSummary,
        error: Option<&str>,
    ) -> Result<(), DbError> {
        let extracted = clamp_i32(summary.total_extracted);
        let saved = clamp_i32(summary.total_saved);
        match error {
            None => newsroom_db::complete_ingest_run(&self.pool, run_id, extracted, saved).await,
            Some(message) => {
                newsroom_db::fail_ingest_run(&self.pool, run_id, extracted, saved, message).await
            }
        }
    }
}
