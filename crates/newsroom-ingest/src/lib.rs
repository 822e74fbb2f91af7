//! Orchestration of the news ingestion pipeline and its moderation flow.
//!
//! [`Pipeline`] drives fetch, extract, normalize and stage across the source
//! registry; [`moderation`] moves staged rows through
//! `pending -> approved | rejected`. Both talk to persistence through
//! [`ArticleStore`].

pub mod error;
pub mod moderation;
pub mod pipeline;
pub mod store;

pub use error::IngestError;
pub use moderation::{approve, draft_from_staged, reject, stats};
pub use pipeline::{Pipeline, RunSummary, RunTrigger, SourceRunResult};
pub use store::{ArticleStore, MemoryArticleStore, MemoryRun, PgArticleStore};
