mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use newsroom_ingest::{PgArticleStore, Pipeline};
use newsroom_scraper::{HttpFetcher, SelectorExtractor};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = newsroom_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting newsroom-server");

    let registry = newsroom_core::load_sources(&config.sources_path)?;
    newsroom_scraper::validate_selectors(&registry)?;
    tracing::info!(
        sources = registry.len(),
        path = %config.sources_path.display(),
        "source registry loaded"
    );

    let pool_config = newsroom_db::PoolConfig::from_app_config(&config);
    let pool = newsroom_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = newsroom_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let fetcher = HttpFetcher::new(
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
    )?;
    let pipeline = Arc::new(Pipeline::new(
        registry,
        fetcher,
        SelectorExtractor,
        PgArticleStore::new(pool.clone()),
        Duration::from_millis(config.scraper_inter_source_delay_ms),
    ));

    let _scheduler = if config.ingest_schedule_enabled {
        Some(scheduler::build_scheduler(Arc::clone(&pipeline), &config.ingest_cron).await?)
    } else {
        tracing::warn!("scheduled ingest disabled; runs only on manual trigger");
        None
    };

    let app = build_app(AppState {
        pool,
        pipeline,
        default_author: Arc::from(config.default_author.as_str()),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
