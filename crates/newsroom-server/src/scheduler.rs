//! Background job scheduler.
//!
//! Registers the recurring `news-ingest` job that runs the pipeline on the
//! configured cron cadence.

use std::sync::Arc;

use newsroom_ingest::{IngestError, RunTrigger};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::NewsPipeline;

pub const INGEST_JOB_NAME: &str = "news-ingest";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered (e.g. a malformed cron expression), or the
/// scheduler fails to start.
pub async fn build_scheduler(
    pipeline: Arc<NewsPipeline>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_ingest_job(&scheduler, pipeline, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_ingest_job(
    scheduler: &JobScheduler,
    pipeline: Arc<NewsPipeline>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);

        Box::pin(async move {
            tracing::info!(job = INGEST_JOB_NAME, "scheduler: starting ingest run");
            match pipeline.run_all(RunTrigger::Scheduler).await {
                Ok(summary) => tracing::info!(
                    job = INGEST_JOB_NAME,
                    total_extracted = summary.total_extracted,
                    total_saved = summary.total_saved,
                    failed_sources = summary.failed_sources(),
                    "scheduler: ingest run complete"
                ),
                Err(IngestError::RunInProgress) => tracing::warn!(
                    job = INGEST_JOB_NAME,
                    "scheduler: previous ingest run still in progress; skipping tick"
                ),
                Err(e) => tracing::error!(
                    job = INGEST_JOB_NAME,
                    error = %e,
                    "scheduler: ingest run failed"
                ),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(job = INGEST_JOB_NAME, cron, "scheduler: job registered");
    Ok(())
}
