//! Fetch, extraction, and normalization stages of the news ingestion pipeline.
//!
//! Each stage sits behind a small seam so the orchestrator can be driven by
//! fixtures in tests: [`Fetcher`] for HTTP, [`Extractor`] for markup parsing,
//! and the pure [`normalize_candidate`] for URL resolution and categorization.

pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;

pub use client::{Fetcher, HttpFetcher};
pub use error::ScraperError;
pub use extract::{validate_selectors, Extractor, RawCandidate, SelectorExtractor};
pub use normalize::{absolutize, normalize_candidate};
