use async_trait::async_trait;
use chrono::Utc;
use newsroom_core::{
    canonical_categories, slug_candidate, NewPublishedArticle, NewStagedArticle, StagedStats,
    StagedStatus,
};
use newsroom_db::{DbError, PublishedArticleRow, RejectOutcome, StagedArticleRow, StagedFilter};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ArticleStore;
use crate::pipeline::{RunSummary, SourceRunResult};

/// A run recorded by [`MemoryArticleStore`].
#[derive(Debug, Clone)]
pub struct MemoryRun {
    pub id: i64,
    pub trigger: String,
    pub finished: bool,
    pub error: Option<String>,
    pub sources: Vec<SourceRunResult>,
}

#[derive(Debug, Default)]
struct State {
    staged: Vec<StagedArticleRow>,
    published: Vec<PublishedArticleRow>,
    categories: Vec<String>,
    runs: Vec<MemoryRun>,
}

/// Process-local [`ArticleStore`]. Every operation holds a single lock, so
/// `promote` is atomic the same way the Postgres transaction is.
#[derive(Debug)]
pub struct MemoryArticleStore {
    state: Mutex<State>,
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArticleStore {
    #[must_use]
    pub fn new() -> Self {
        let categories = canonical_categories()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            state: Mutex::new(State {
                categories,
                ..State::default()
            }),
        }
    }

    /// Snapshot of every published article, oldest first.
    pub async fn published(&self) -> Vec<PublishedArticleRow> {
        self.state.lock().await.published.clone()
    }

    /// Snapshot of every recorded run, oldest first.
    pub async fn runs(&self) -> Vec<MemoryRun> {
        self.state.lock().await.runs.clone()
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX - 1) + 1
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn url_exists(&self, original_url: &str) -> Result<bool, DbError> {
        let state = self.state.lock().await;
        Ok(state.staged.iter().any(|r| r.original_url == original_url))
    }

    async fn insert_staged(&self, article: &NewStagedArticle) -> Result<Option<i64>, DbError> {
        let mut state = self.state.lock().await;
        if state
            .staged
            .iter()
            .any(|r| r.original_url == article.original_url)
        {
            return Ok(None);
        }

        let id = next_id(state.staged.len());
        state.staged.push(StagedArticleRow {
            id,
            source_id: article.source_id.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
            excerpt: article.excerpt.clone(),
            image_url: article.image_url.clone(),
            category: article.category.clone(),
            original_url: article.original_url.clone(),
            published_at: article.published_at,
            status: StagedStatus::Pending.as_str().to_string(),
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
        });
        Ok(Some(id))
    }

    async fn get_staged(&self, id: i64) -> Result<Option<StagedArticleRow>, DbError> {
        let state = self.state.lock().await;
        Ok(state.staged.iter().find(|r| r.id == id).cloned())
    }

    async fn list_staged(
        &self,
        filter: &StagedFilter<'_>,
        limit: i64,
    ) -> Result<Vec<StagedArticleRow>, DbError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .staged
            .iter()
            .rev()
            .filter(|r| filter.status.is_none_or(|s| r.status == s.as_str()))
            .filter(|r| filter.source_id.is_none_or(|s| r.source_id == s))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn promote(&self, draft: &NewPublishedArticle) -> Result<PublishedArticleRow, DbError> {
        let mut state = self.state.lock().await;

        let staged = state
            .staged
            .iter()
            .position(|r| r.id == draft.staged_id)
            .ok_or(DbError::NotFound)?;
        if state.staged[staged].status != StagedStatus::Pending.as_str() {
            return Err(DbError::InvalidTransition {
                id: draft.staged_id,
                status: state.staged[staged].status.clone(),
            });
        }

        let known = state
            .categories
            .iter()
            .position(|c| *c == draft.category_name);
        let category_index = if let Some(index) = known {
            index
        } else {
            state.categories.push(draft.category_name.clone());
            state.categories.len() - 1
        };

        let mut attempt = 0;
        let slug = loop {
            let slug = slug_candidate(&draft.slug, draft.staged_id, attempt);
            if !state.published.iter().any(|p| p.slug == slug) {
                break slug;
            }
            attempt += 1;
        };

        let now = Utc::now();
        let row = PublishedArticleRow {
            id: next_id(state.published.len()),
            public_id: Uuid::new_v4(),
            title: draft.title.clone(),
            slug,
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            image_url: draft.image_url.clone(),
            category_id: next_id(category_index),
            author: draft.author.clone(),
            status: "published".to_string(),
            source_staged_id: Some(draft.staged_id),
            published_at: Some(now),
            created_at: now,
        };
        state.published.push(row.clone());

        let staged = &mut state.staged[staged];
        staged.status = StagedStatus::Approved.as_str().to_string();
        staged.approved_at = Some(now);

        Ok(row)
    }

    async fn reject(&self, id: i64) -> Result<RejectOutcome, DbError> {
        let mut state = self.state.lock().await;
        let row = state
            .staged
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DbError::NotFound)?;

        match row.staged_status() {
            StagedStatus::Pending => {
                row.status = StagedStatus::Rejected.as_str().to_string();
                row.rejected_at = Some(Utc::now());
                Ok(RejectOutcome::Rejected)
            }
            StagedStatus::Rejected => Ok(RejectOutcome::AlreadyRejected),
            StagedStatus::Approved => Err(DbError::InvalidTransition {
                id,
                status: row.status.clone(),
            }),
        }
    }

    async fn stats(&self) -> Result<StagedStats, DbError> {
        let state = self.state.lock().await;
        Ok(StagedStats::from_groups(
            state
                .staged
                .iter()
                .map(|r| (r.source_id.clone(), r.staged_status(), 1)),
        ))
    }

    async fn begin_run(&self, trigger: &str) -> Result<i64, DbError> {
        let mut state = self.state.lock().await;
        let id = next_id(state.runs.len());
        state.runs.push(MemoryRun {
            id,
            trigger: trigger.to_string(),
            finished: false,
            error: None,
            sources: Vec::new(),
        });
        Ok(id)
    }

    async fn record_source(&self, run_id: i64, result: &SourceRunResult) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or(DbError::NotFound)?;
        run.sources.push(result.clone());
        Ok(())
    }

    async fn finish_run(
        &self,
        run_id: i64,
        _summary: &RunSummary,
        error: Option<&str>,
    ) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == run_id && !r.finished)
            .ok_or(DbError::NotFound)?;
        run.finished = true;
        run.error = error.map(str::to_string);
        Ok(())
    }
}
