use newsroom_db::DbError;
use newsroom_scraper::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScraperError),

    #[error("store error: {0}")]
    Store(#[from] DbError),

    #[error("no such staged article: {0}")]
    NotFound(i64),

    #[error("staged article {id} is already {status}")]
    InvalidTransition { id: i64, status: String },

    #[error("an ingest run is already in progress")]
    RunInProgress,

    #[error("all {failed} sources failed")]
    AllSourcesFailed { failed: usize },
}

impl IngestError {
    /// Lift a store error raised while acting on staged row `id`, turning the
    /// moderation-specific variants into their top-level counterparts.

    pub(crate) fn from_store(id: i64, err: DbError) -> Self {
        match err {
            DbError::NotFound => IngestError::NotFound(id),
            DbError::InvalidTransition { id, status } => {
                IngestError::InvalidTransition { id, status }
            }
            other => IngestError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_staged_row_maps_to_not_found() {
        assert!(matches!(
            IngestError::from_store(9, DbError::NotFound),
            IngestError::NotFound(9)
        ));
    }

    #[test]
    fn missing_default_category_stays_a_store_error() {
        let err = IngestError::from_store(9, DbError::CategoryUnavailable("Politica".into()));
        assert!(matches!(err, IngestError::Store(DbError::CategoryUnavailable(_))));
        assert!(!err.to_string().contains("no such staged article"));
    }
}
