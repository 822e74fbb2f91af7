//! Static registry of external news sources.
//!
//! Loaded once at process start from `config/sources.yaml`, validated, and then
//! shared read-only (usually behind an `Arc`) for the lifetime of the process.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// CSS selectors locating the parts of an article teaser on a source's front
/// page. `title`, `link`, `image`, `category` and `summary` are evaluated
/// relative to each element matched by `container`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    pub container: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSource {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub selectors: SelectorSet,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Label mapped when a teaser carries no category of its own.
    #[serde(default)]
    pub default_category: Option<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<NewsSource>,
}

impl SourceRegistry {
    /// Build a registry from already-constructed sources, applying the same
    /// validation as [`load_sources`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any source is invalid.
    pub fn new(sources: Vec<NewsSource>) -> Result<Self, ConfigError> {
        let registry = Self { sources };
        validate_sources(&registry)?;
        Ok(registry)
    }

    /// Sources that take part in a run, in registry order.
    pub fn enabled(&self) -> impl Iterator<Item = &NewsSource> {
        self.sources.iter().filter(|s| s.enabled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Load and validate the source registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourceRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_sources(&content)
}

/// Parse and validate a registry from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text cannot be parsed or fails validation.
pub fn parse_sources(yaml: &str) -> Result<SourceRegistry, ConfigError> {
    let registry: SourceRegistry =
        serde_yaml::from_str(yaml).map_err(ConfigError::SourcesFileParse)?;
    validate_sources(&registry)?;
    Ok(registry)
}

fn validate_sources(registry: &SourceRegistry) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    for source in &registry.sources {
        if source.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source id must be non-empty".to_string(),
            ));
        }

        if !source
            .id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "source id '{}' may only contain lowercase letters, digits and '-'",
                source.id
            )));
        }

        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' has an empty name",
                source.id
            )));
        }

        if !seen_ids.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{}'",
                source.id
            )));
        }

        if !seen_names.insert(source.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }

        match url::Url::parse(&source.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => {}
            Ok(u) => {
                return Err(ConfigError::Validation(format!(
                    "source '{}' base_url must be an absolute http(s) URL, got scheme '{}'",
                    source.id,
                    u.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has an invalid base_url '{}': {e}",
                    source.id, source.base_url
                )));
            }
        }

        let sel = &source.selectors;
        for (field, value) in [
            ("container", Some(&sel.container)),
            ("title", Some(&sel.title)),
            ("link", Some(&sel.link)),
            ("image", sel.image.as_ref()),
            ("category", sel.category.as_ref()),
            ("summary", sel.summary.as_ref()),
        ] {
            if value.is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has an empty '{field}' selector",
                    source.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
