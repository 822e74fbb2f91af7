//! Sequential multi-source ingestion run.
//!
//! One [`Pipeline::run_all`] call walks the enabled sources in registry order,
//! and for each one fetches the front page, extracts teaser candidates,
//! normalizes them, and stages any URL not seen before. A failing source is
//! logged and reported with zero saved; it never aborts the run. Only one run
//! may be in flight per pipeline.

use std::time::Duration;

use chrono::Utc;
use newsroom_core::{NewsSource, SourceRegistry};
use newsroom_scraper::{normalize_candidate, Extractor, Fetcher};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::IngestError;
use crate::store::ArticleStore;

/// Who started a run; stored with the run history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Scheduler,
    Api,
    Cli,
}

impl RunTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunTrigger::Scheduler => "scheduler",
            RunTrigger::Api => "api",
            RunTrigger::Cli => "cli",
        }
    }
}

/// Outcome of one source within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRunResult {
    pub source_id: String,
    /// Candidates the extractor produced.
    pub extracted: usize,
    /// Rows newly inserted into staging.
    pub saved: usize,
    /// Set when the source was skipped because of a fetch, extraction or
    /// store failure.
    pub error: Option<String>,
}

impl SourceRunResult {
    fn failed(source_id: &str, error: &IngestError) -> Self {
        Self {
            source_id: source_id.to_string(),
            extracted: 0,
            saved: 0,
            error: Some(error.to_string()),
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate totals of one run, with a per-source breakdown in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Run history id, when history could be recorded.
    pub run_id: Option<i64>,
    pub total_extracted: usize,
    pub total_saved: usize,
    pub sources: Vec<SourceRunResult>,
}

impl RunSummary {
    #[must_use]
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.succeeded()).count()
    }

    fn push(&mut self, result: SourceRunResult) {
        self.total_extracted += result.extracted;
        self.total_saved += result.saved;
        self.sources.push(result);
    }
}

pub struct Pipeline<F, E, S> {
    registry: SourceRegistry,
    fetcher: F,
    extractor: E,
    store: S,
    inter_source_delay: Duration,
    run_lock: Mutex<()>,
}

impl<F, E, S> Pipeline<F, E, S>
where
    F: Fetcher,
    E: Extractor,
    S: ArticleStore,
{
    pub fn new(
        registry: SourceRegistry,
        fetcher: F,
        extractor: E,
        store: S,
        inter_source_delay: Duration,
    ) -> Self {
        Self {
            registry,
            fetcher,
            extractor,
            store,
            inter_source_delay,
            run_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a run currently holds the lock.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Process every enabled source once, sequentially.
    ///
    /// # Errors
    ///
    /// - [`IngestError::RunInProgress`] if another run on this pipeline has
    ///   not finished yet.
    /// - [`IngestError::AllSourcesFailed`] if at least one source is enabled
    ///   and every one of them failed.
    pub async fn run_all(&self, trigger: RunTrigger) -> Result<RunSummary, IngestError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| IngestError::RunInProgress)?;

        let sources: Vec<&NewsSource> = self.registry.enabled().collect();
        tracing::info!(
            trigger = trigger.as_str(),
            sources = sources.len(),
            "starting ingest run"
        );

        let mut summary = RunSummary {
            run_id: self.begin_run_best_effort(trigger).await,
            ..RunSummary::default()
        };

        for (index, source) in sources.iter().enumerate() {
            let result = match self.process_source(source).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(source = %source.id, error = %e, "source failed, skipping");
                    SourceRunResult::failed(&source.id, &e)
                }
            };

            if let Some(run_id) = summary.run_id {
                if let Err(e) = self.store.record_source(run_id, &result).await {
                    tracing::warn!(
                        run_id,
                        source = %source.id,
                        error = %e,
                        "could not record source outcome"
                    );
                }
            }
            summary.push(result);

            if index + 1 < sources.len() && !self.inter_source_delay.is_zero() {
                tokio::time::sleep(self.inter_source_delay).await;
            }
        }

        let failed = summary.failed_sources();
        if !sources.is_empty() && failed == sources.len() {
            let message = format!("all {failed} sources failed");
            self.finish_run_best_effort(&summary, Some(&message)).await;
            tracing::error!(failed, "ingest run failed for every source");
            return Err(IngestError::AllSourcesFailed { failed });
        }

        if failed > 0 {
            tracing::warn!(
                failed_sources = failed,
                total_sources = sources.len(),
                "some sources failed during ingest"
            );
        }

        self.finish_run_best_effort(&summary, None).await;
        tracing::info!(
            total_extracted = summary.total_extracted,
            total_saved = summary.total_saved,
            "ingest run complete"
        );
        Ok(summary)
    }

    async fn process_source(&self, source: &NewsSource) -> Result<SourceRunResult, IngestError> {
        let html = self.fetcher.fetch(&source.base_url).await?;
        let candidates = self.extractor.extract(&html, &source.selectors)?;
        let extracted = candidates.len();

        let mut saved = 0;
        for raw in candidates {
            let article = match normalize_candidate(raw, source, Utc::now()) {
                Ok(article) => article,
                Err(e) => {
                    tracing::debug!(source = %source.id, error = %e, "skipping candidate");
                    continue;
                }
            };

            if self.store.url_exists(&article.original_url).await? {
                tracing::debug!(url = %article.original_url, "already staged, skipping");
                continue;
            }
            if self.store.insert_staged(&article).await?.is_some() {
                saved += 1;
            }
        }

        tracing::info!(source = %source.id, extracted, saved, "source processed");
        Ok(SourceRunResult {
            source_id: source.id.clone(),
            extracted,
            saved,
            error: None,
        })
    }

    async fn begin_run_best_effort(&self, trigger: RunTrigger) -> Option<i64> {
        match self.store.begin_run(trigger.as_str()).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "could not record run start; continuing without history"
                );
                None
            }
        }
    }

    async fn finish_run_best_effort(&self, summary: &RunSummary, error: Option<&str>) {
        let Some(run_id) = summary.run_id else {
            return;
        };
        if let Err(e) = self.store.finish_run(run_id, summary, error).await {
            tracing::warn!(run_id, error = %e, "could not record run completion");
        }
    }
}
