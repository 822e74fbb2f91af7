//! Shared configuration, domain types, and pure text algorithms for the
//! newsroom ingestion pipeline.

pub mod app_config;
pub mod articles;
pub mod categories;
pub mod config;
pub mod sources;
pub mod text;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use articles::{
    NewPublishedArticle, NewStagedArticle, SourceStatusCounts, StagedStats, StagedStatus,
};
pub use categories::{
    canonical_categories, map_category, CategoryRule, CATEGORY_RULES, DEFAULT_CATEGORY,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use sources::{load_sources, parse_sources, NewsSource, SelectorSet, SourceRegistry};
pub use text::{
    clean_text, fold_accents, make_excerpt, slug_candidate, slugify, EXCERPT_MAX_CHARS,
    SLUG_MAX_LEN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[source] serde_yaml::Error),

    #[error("invalid source configuration: {0}")]
    Validation(String),
}
