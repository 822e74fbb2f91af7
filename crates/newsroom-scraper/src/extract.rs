//! Candidate extraction from front-page markup.

use newsroom_core::{clean_text, SelectorSet, SourceRegistry};
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;

/// One article teaser as found on the page, before URL resolution and
/// category mapping. `link` and `image` may still be relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub link: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
}

/// Turns a source page into raw candidates according to its selectors.
pub trait Extractor: Send + Sync {
    /// Returns candidates in document order. Containers without a non-empty
    /// title or a link are skipped silently; missing optional fields are `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] if a selector does not parse.
    fn extract(
        &self,
        html: &str,
        selectors: &SelectorSet,
    ) -> Result<Vec<RawCandidate>, ScraperError>;
}

/// [`Extractor`] evaluating CSS selectors with the `scraper` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorExtractor;

/// Attributes tried, in order, for an image URL. Lazy-loading themes leave
/// `src` as a placeholder and put the real URL in a data attribute.
const IMAGE_ATTRS: &[&str] = &["data-src", "data-lazy-src", "src", "srcset"];

struct Compiled {
    container: Selector,
    title: Selector,
    link: Selector,
    image: Option<Selector>,
    category: Option<Selector>,
    summary: Option<Selector>,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        field,
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_opt(
    field: &'static str,
    selector: Option<&String>,
) -> Result<Option<Selector>, ScraperError> {
    selector.map(|s| compile(field, s)).transpose()
}

impl Compiled {
    fn new(selectors: &SelectorSet) -> Result<Self, ScraperError> {
        Ok(Self {
            container: compile("container", &selectors.container)?,
            title: compile("title", &selectors.title)?,
            link: compile("link", &selectors.link)?,
            image: compile_opt("image", selectors.image.as_ref())?,
            category: compile_opt("category", selectors.category.as_ref())?,
            summary: compile_opt("summary", selectors.summary.as_ref())?,
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract(
        &self,
        html: &str,
        selectors: &SelectorSet,
    ) -> Result<Vec<RawCandidate>, ScraperError> {
        let compiled = Compiled::new(selectors)?;
        let document = Html::parse_document(html);

        let candidates = document
            .select(&compiled.container)
            .filter_map(|container| read_candidate(container, &compiled))
            .collect();

        Ok(candidates)
    }
}

fn read_candidate(container: ElementRef<'_>, sel: &Compiled) -> Option<RawCandidate> {
    let title = container
        .select(&sel.title)
        .map(element_text)
        .find(|t| !t.is_empty())?;

    let link = container
        .select(&sel.link)
        .find_map(|el| non_empty_attr(el, "href"))
        // A container that is itself the anchor carries the href directly.
        .or_else(|| non_empty_attr(container, "href"))?;

    let image = sel.image.as_ref().and_then(|s| {
        container.select(s).find_map(|el| {
            IMAGE_ATTRS
                .iter()
                .find_map(|attr| non_empty_attr(el, attr))
                .map(|v| first_srcset_url(&v))
        })
    });

    let category = sel
        .category
        .as_ref()
        .and_then(|s| container.select(s).map(element_text).find(|t| !t.is_empty()));

    let summary = sel
        .summary
        .as_ref()
        .and_then(|s| container.select(s).map(element_text).find(|t| !t.is_empty()));

    Some(RawCandidate {
        title,
        link,
        image,
        category,
        summary,
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}

fn non_empty_attr(el: ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// `srcset` holds `url width, url width`; keep the first URL. Plain URLs pass
/// through unchanged.
fn first_srcset_url(value: &str) -> String {
    value
        .split(',')
        .next()
        .and_then(|candidate| candidate.split_whitespace().next())
        .unwrap_or(value)
        .to_owned()
}

/// Compile every selector of every source in the registry.
///
/// Run once at startup so a typo in `sources.yaml` surfaces immediately
/// instead of as a failed source on every run.
///
/// # Errors
///
/// Returns the first [`ScraperError::InvalidSelector`] found, with the source
/// id prepended to the selector field.
pub fn validate_selectors(registry: &SourceRegistry) -> Result<(), ScraperError> {
    for source in &registry.sources {
        Compiled::new(&source.selectors).map_err(|e| match e {
            ScraperError::InvalidSelector {
                field,
                selector,
                reason,
            } => ScraperError::InvalidSelector {
                field,
                selector: format!("{}: {selector}", source.id),
                reason,
            },
            other => other,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
