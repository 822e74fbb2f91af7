//! Normalization from [`RawCandidate`] to [`NewStagedArticle`].
//!
//! Resolves relative URLs against the source's base URL, derives the excerpt
//! from the title, and maps the free-text label onto the canonical taxonomy.

use chrono::{DateTime, Utc};
use newsroom_core::{make_excerpt, map_category, NewStagedArticle, NewsSource};
use url::Url;

use crate::error::ScraperError;
use crate::extract::RawCandidate;

/// Resolve `href` against `base`, returning an absolute `http(s)` URL.
///
/// Already-absolute `http(s)` URLs are returned as-is; relative and
/// protocol-relative references are joined onto `base`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base` does not parse, the join
/// fails, or the result is not `http`/`https` (e.g. `mailto:`, `javascript:`).
pub fn absolutize(base: &str, href: &str) -> Result<String, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidUrl {
        href: href.to_owned(),
        base: base.to_owned(),
        reason,
    };

    let resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base_url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
            base_url.join(href).map_err(|e| invalid(e.to_string()))?
        }
        Err(e) => return Err(invalid(e.to_string())),
    };

    if !matches!(resolved.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme \"{}\"",
            resolved.scheme()
        )));
    }

    Ok(resolved.to_string())
}

/// Normalize one extracted candidate for `source`.
///
/// `content` is the teaser summary when the source exposes one, else the
/// title. When the teaser has no category label the source's
/// `default_category` is mapped instead; with neither, the result is the
/// default category. An unresolvable image is dropped rather than failing
/// the candidate.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if the article link cannot be
/// resolved to an absolute `http(s)` URL.
pub fn normalize_candidate(
    raw: RawCandidate,
    source: &NewsSource,
    published_at: DateTime<Utc>,
) -> Result<NewStagedArticle, ScraperError> {
    let original_url = absolutize(&source.base_url, &raw.link)?;

    let image_url = raw.image.and_then(|img| match absolutize(&source.base_url, &img) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(source = %source.id, error = %e, "dropping unusable image url");
            None
        }
    });

    let label = raw
        .category
        .as_deref()
        .or(source.default_category.as_deref())
        .unwrap_or_default();
    let category = map_category(label).to_string();

    let excerpt = make_excerpt(&raw.title);
    let content = raw.summary.unwrap_or_else(|| raw.title.clone());

    Ok(NewStagedArticle {
        source_id: source.id.clone(),
        title: raw.title,
        content,
        excerpt,
        image_url,
        category,
        original_url,
        published_at,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
