//! End-to-end runs of [`Pipeline`] against `wiremock` front pages and the
//! in-memory store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use newsroom_core::{
    NewPublishedArticle, NewStagedArticle, NewsSource, SelectorSet, SourceRegistry, StagedStats,
};
use newsroom_db::{DbError, PublishedArticleRow, RejectOutcome, StagedArticleRow, StagedFilter};
use newsroom_ingest::{
    ArticleStore, IngestError, MemoryArticleStore, Pipeline, RunSummary, RunTrigger,
    SourceRunResult,
};
use newsroom_scraper::{HttpFetcher, SelectorExtractor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn source(server: &MockServer, id: &str) -> NewsSource {
    NewsSource {
        id: id.to_string(),
        name: format!("Diario {id}"),
        base_url: format!("{}/{id}", server.uri()),
        selectors: SelectorSet {
            container: "article".to_string(),
            title: "h2".to_string(),
            link: "a".to_string(),
            image: Some("img".to_string()),
            category: Some(".seccion".to_string()),
            summary: None,
        },
        enabled: true,
        default_category: None,
    }
}

fn page(items: &[(&str, &str)]) -> String {
    let articles: String = items
        .iter()
        .map(|(title, href)| {
            format!(
                "<article><span class=\"seccion\">Política</span>\
                 <h2>{title}</h2><a href=\"{href}\">Leer</a></article>"
            )
        })
        .collect();
    format!("<html><body>{articles}</body></html>")
}

async fn mount_page(server: &MockServer, id: &str, items: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(format!("/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(items)))
        .mount(server)
        .await;
}

fn pipeline_with<S: ArticleStore>(
    sources: Vec<NewsSource>,
    store: S,
    timeout_secs: u64,
    delay: Duration,
) -> Pipeline<HttpFetcher, SelectorExtractor, S> {
    let registry = SourceRegistry::new(sources).expect("valid registry");
    let fetcher = HttpFetcher::new(timeout_secs, "newsroom-test").expect("fetcher");
    Pipeline::new(registry, fetcher, SelectorExtractor, store, delay)
}

fn pipeline(
    sources: Vec<NewsSource>,
) -> Pipeline<HttpFetcher, SelectorExtractor, MemoryArticleStore> {
    pipeline_with(sources, MemoryArticleStore::new(), 1, Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_run_over_unchanged_pages_saves_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, "uno", &[("Uno", "/n/1"), ("Dos", "/n/2")]).await;

    let pipeline = pipeline(vec![source(&server, "uno")]);

    let first = pipeline.run_all(RunTrigger::Cli).await.expect("first run");
    assert_eq!(first.total_extracted, 2);
    assert_eq!(first.total_saved, 2);

    let second = pipeline.run_all(RunTrigger::Cli).await.expect("second run");
    assert_eq!(second.total_extracted, 2);
    assert_eq!(second.total_saved, 0);
    assert_eq!(second.sources[0].saved, 0);

    let stats = pipeline.store().stats().await.expect("stats");
    assert_eq!(stats.pending, 2);
}

#[tokio::test]
async fn timed_out_source_is_skipped_and_reported_as_zero() {
    let server = MockServer::start().await;
    mount_page(&server, "uno", &[("Uno A", "/uno/a")]).await;
    Mock::given(method("GET"))
        .and(path("/dos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page(&[("Dos A", "/dos/a")]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "tres", &[("Tres A", "/tres/a"), ("Tres B", "/tres/b")]).await;

    let pipeline = pipeline(vec![
        source(&server, "uno"),
        source(&server, "dos"),
        source(&server, "tres"),
    ]);
    let summary = pipeline.run_all(RunTrigger::Api).await.expect("run");

    let ids: Vec<&str> = summary.sources.iter().map(|s| s.source_id.as_str()).collect();
    assert_eq!(ids, ["uno", "dos", "tres"]);
    assert_eq!(summary.sources[0].saved, 1);
    assert_eq!(summary.sources[1].saved, 0);
    assert!(summary.sources[1].error.is_some());
    assert_eq!(summary.sources[2].saved, 2);
    assert_eq!(summary.total_saved, 3);
    assert_eq!(summary.failed_sources(), 1);
}

#[tokio::test]
async fn non_success_status_fails_only_that_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uno"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "dos", &[("Dos A", "/dos/a")]).await;

    let pipeline = pipeline(vec![source(&server, "uno"), source(&server, "dos")]);
    let summary = pipeline.run_all(RunTrigger::Cli).await.expect("run");

    assert!(summary.sources[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("503")));
    assert_eq!(summary.total_saved, 1);
}

#[tokio::test]
async fn every_source_failing_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let pipeline = pipeline(vec![source(&server, "uno"), source(&server, "dos")]);
    let result = pipeline.run_all(RunTrigger::Scheduler).await;
    assert!(
        matches!(result, Err(IngestError::AllSourcesFailed { failed: 2 })),
        "got: {result:?}"
    );

    let runs = pipeline.store().runs().await;
    assert_eq!(runs.len(), 1);
    assert!(runs[0].finished);
    assert_eq!(runs[0].error.as_deref(), Some("all 2 sources failed"));
}

#[tokio::test]
async fn duplicate_links_on_one_page_keep_the_first_title() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "uno",
        &[("Primera versión", "/nota"), ("Segunda versión", "/nota")],
    )
    .await;

    let pipeline = pipeline(vec![source(&server, "uno")]);
    let summary = pipeline.run_all(RunTrigger::Cli).await.expect("run");
    assert_eq!(summary.total_extracted, 2);
    assert_eq!(summary.total_saved, 1);

    let rows = pipeline
        .store()
        .list_staged(&StagedFilter::default(), 10)
        .await
        .expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Primera versión");
    assert_eq!(rows[0].original_url, format!("{}/nota", server.uri()));
    assert_eq!(rows[0].category, "Política");
}

#[tokio::test]
async fn disabled_sources_are_not_fetched() {
    let server = MockServer::start().await;
    mount_page(&server, "uno", &[("Uno", "/uno/1")]).await;
    Mock::given(method("GET"))
        .and(path("/dos"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut disabled = source(&server, "dos");
    disabled.enabled = false;
    let pipeline = pipeline(vec![source(&server, "uno"), disabled]);
    let summary = pipeline.run_all(RunTrigger::Cli).await.expect("run");
    assert_eq!(summary.sources.len(), 1);
}

#[tokio::test]
async fn sources_are_spaced_by_the_inter_source_delay() {
    let server = MockServer::start().await;
    for id in ["uno", "dos", "tres"] {
        let href = format!("/{id}/1");
        mount_page(&server, id, &[("Nota", href.as_str())]).await;
    }

    let pipeline = pipeline_with(
        vec![
            source(&server, "uno"),
            source(&server, "dos"),
            source(&server, "tres"),
        ],
        MemoryArticleStore::new(),
        1,
        Duration::from_millis(150),
    );

    let started = Instant::now();
    pipeline.run_all(RunTrigger::Cli).await.expect("run");
    // Two gaps for three sources; none after the last.
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn overlapping_run_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uno"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page(&[("Lenta", "/lenta")]))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let pipeline = Arc::new(pipeline_with(
        vec![source(&server, "uno")],
        MemoryArticleStore::new(),
        5,
        Duration::ZERO,
    ));

    let background = Arc::clone(&pipeline);
    let first = tokio::spawn(async move { background.run_all(RunTrigger::Scheduler).await });
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(pipeline.is_running());
    let second = pipeline.run_all(RunTrigger::Api).await;
    assert!(matches!(second, Err(IngestError::RunInProgress)), "got: {second:?}");

    let first = first.await.expect("join").expect("first run");
    assert_eq!(first.total_saved, 1);
    assert!(!pipeline.is_running());
}

#[tokio::test]
async fn run_history_records_each_source() {
    let server = MockServer::start().await;
    mount_page(&server, "uno", &[("Uno", "/uno/1")]).await;
    Mock::given(method("GET"))
        .and(path("/dos"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let pipeline = pipeline(vec![source(&server, "uno"), source(&server, "dos")]);
    let summary = pipeline.run_all(RunTrigger::Cli).await.expect("run");

    let runs = pipeline.store().runs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(summary.run_id, Some(runs[0].id));
    assert_eq!(runs[0].trigger, "cli");
    assert!(runs[0].finished);
    assert!(runs[0].error.is_none());
    assert_eq!(runs[0].sources.len(), 2);
    assert!(runs[0].sources[0].succeeded());
    assert!(!runs[0].sources[1].succeeded());
}

// ---------------------------------------------------------------------------
// Store failures
// ---------------------------------------------------------------------------

/// Delegates to [`MemoryArticleStore`] but refuses inserts for one source and
/// every run-history write.
struct FlakyStore {
    inner: MemoryArticleStore,
    broken_source: &'static str,
}

fn unavailable() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl ArticleStore for FlakyStore {
    async fn url_exists(&self, original_url: &str) -> Result<bool, DbError> {
        self.inner.url_exists(original_url).await
    }

    async fn insert_staged(&self, article: &NewStagedArticle) -> Result<Option<i64>, DbError> {
        if article.source_id == self.broken_source {
            return Err(unavailable());
        }
        self.inner.insert_staged(article).await
    }

    async fn get_staged(&self, id: i64) -> Result<Option<StagedArticleRow>, DbError> {
        self.inner.get_staged(id).await
    }

    async fn list_staged(
        &self,
        filter: &StagedFilter<'_>,
        limit: i64,
    ) -> Result<Vec<StagedArticleRow>, DbError> {
        self.inner.list_staged(filter, limit).await
    }

    async fn promote(&self, draft: &NewPublishedArticle) -> Result<PublishedArticleRow, DbError> {
        self.inner.promote(draft).await
    }

    async fn reject(&self, id: i64) -> Result<RejectOutcome, DbError> {
        self.inner.reject(id).await
    }

    async fn stats(&self) -> Result<StagedStats, DbError> {
        self.inner.stats().await
    }

    async fn begin_run(&self, _trigger: &str) -> Result<i64, DbError> {
        Err(unavailable())
    }

    async fn record_source(&self, _run_id: i64, _result: &SourceRunResult) -> Result<(), DbError> {
        Err(unavailable())
    }

    async fn finish_run(
        &self,
        _run_id: i64,
        _summary: &RunSummary,
        _error: Option<&str>,
    ) -> Result<(), DbError> {
        Err(unavailable())
    }
}

#[tokio::test]
async fn store_failure_skips_source_and_history_is_best_effort() {
    let server = MockServer::start().await;
    mount_page(&server, "uno", &[("Uno", "/uno/1")]).await;
    mount_page(&server, "dos", &[("Dos", "/dos/1")]).await;

    let store = FlakyStore {
        inner: MemoryArticleStore::new(),
        broken_source: "uno",
    };
    let pipeline = pipeline_with(
        vec![source(&server, "uno"), source(&server, "dos")],
        store,
        1,
        Duration::ZERO,
    );

    let summary = pipeline.run_all(RunTrigger::Cli).await.expect("run");
    assert!(summary.run_id.is_none());
    assert_eq!(summary.sources[0].saved, 0);
    assert!(summary.sources[0].error.is_some());
    assert_eq!(summary.sources[1].saved, 1);
    assert_eq!(summary.total_saved, 1);
}
