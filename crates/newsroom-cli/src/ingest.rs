use std::time::Duration;

use newsroom_core::{AppConfig, SourceRegistry};
use newsroom_db::{DbError, StagedArticleRow, StagedFilter};
use newsroom_ingest::{
    ArticleStore, IngestError, MemoryArticleStore, PgArticleStore, Pipeline, RunSummary,
    RunTrigger,
};
use newsroom_scraper::{HttpFetcher, SelectorExtractor};
use sqlx::PgPool;

fn load_registry(config: &AppConfig) -> anyhow::Result<SourceRegistry> {
    let registry = newsroom_core::load_sources(&config.sources_path)?;
    newsroom_scraper::validate_selectors(&registry)?;
    Ok(registry)
}

fn build_pipeline<S: ArticleStore>(
    config: &AppConfig,
    store: S,
) -> anyhow::Result<Pipeline<HttpFetcher, SelectorExtractor, S>> {
    let registry = load_registry(config)?;
    let fetcher = HttpFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    Ok(Pipeline::new(
        registry,
        fetcher,
        SelectorExtractor,
        store,
        Duration::from_millis(config.scraper_inter_source_delay_ms),
    ))
}

/// Print the source registry after validating every selector.
pub(crate) fn list_sources(config: &AppConfig) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    println!(
        "{} source(s) in {}; selectors valid",
        registry.len(),
        config.sources_path.display()
    );
    for source in &registry.sources {
        let state = if source.enabled { "enabled" } else { "disabled" };
        println!("  {:<20} {:<9} {}", source.id, state, source.base_url);
    }
    Ok(())
}

/// Run one pass against the database.
pub(crate) async fn run(pool: PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let applied = newsroom_db::run_migrations(&pool).await?;
    tracing::debug!(applied, "migrations up to date");
    let pipeline = build_pipeline(config, PgArticleStore::new(pool))?;
    finish(pipeline.run_all(RunTrigger::Cli).await)
}

/// Fetch and extract every enabled source into a throwaway in-memory store.
pub(crate) async fn run_dry(config: &AppConfig) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config, MemoryArticleStore::new())?;
    tracing::info!(
        sources = pipeline.registry().enabled().count(),
        "dry run against in-memory store"
    );
    let result = pipeline.run_all(RunTrigger::Cli).await;
    println!("dry run: nothing was written to the database");
    finish(result)?;

    let lines = would_save(pipeline.store()).await?;
    println!("{} article(s) would be staged:", lines.len());
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per staged candidate, in the order the run produced them.
pub(crate) async fn would_save(store: &MemoryArticleStore) -> Result<Vec<String>, DbError> {
    let mut rows = store
        .list_staged(&StagedFilter::default(), i64::MAX)
        .await?;
    rows.reverse();
    Ok(rows.iter().map(candidate_line).collect())
}

fn candidate_line(row: &StagedArticleRow) -> String {
    format!(
        "  [{}] {} | {} | {}",
        row.source_id, row.title, row.category, row.original_url
    )
}

fn finish(result: Result<RunSummary, IngestError>) -> anyhow::Result<()> {
    let summary = result?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    for source in &summary.sources {
        match &source.error {
            None => println!(
                "  {:<20} extracted {:>4}  saved {:>4}",
                source.source_id, source.extracted, source.saved
            ),
            Some(error) => println!("  {:<20} FAILED: {error}", source.source_id),
        }
    }
    println!(
        "total: extracted {}, saved {}, failed sources {}",
        summary.total_extracted,
        summary.total_saved,
        summary.failed_sources()
    );
}
