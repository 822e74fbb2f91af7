use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation state of a staged article.
///
/// `Pending` is assigned at insertion; `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagedStatus {
    Pending,
    Approved,
    Rejected,
}

impl StagedStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StagedStatus::Pending => "pending",
            StagedStatus::Approved => "approved",
            StagedStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for StagedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StagedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StagedStatus::Pending),
            "approved" => Ok(StagedStatus::Approved),
            "rejected" => Ok(StagedStatus::Rejected),
            other => Err(format!("unknown staged status \"{other}\"")),
        }
    }
}

/// A normalized candidate ready for the staging table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewStagedArticle {
    pub source_id: String,
    pub title: String,
    /// Body text when the source exposes one, otherwise the title.
    pub content: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    /// Canonical category name.
    pub category: String,
    /// Absolute article URL; the deduplication key.
    pub original_url: String,
    pub published_at: DateTime<Utc>,
}

/// Everything needed to create the publish-ready copy of a staged article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPublishedArticle {
    pub staged_id: i64,
    pub title: String,
    /// Base slug; the store may suffix it to keep slugs unique.
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image_url: Option<String>,
    pub category_name: String,
    pub author: String,
}

/// Staged-row counts for one source, split by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStatusCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl SourceStatusCounts {
    pub fn add(&mut self, status: StagedStatus, count: i64) {
        match status {
            StagedStatus::Pending => self.pending += count,
            StagedStatus::Approved => self.approved += count,
            StagedStatus::Rejected => self.rejected += count,
        }
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}

/// Read-side summary of the staging table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagedStats {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub by_source: BTreeMap<String, SourceStatusCounts>,
}

impl StagedStats {
    /// Fold `(source_id, status, count)` group rows into a summary.
    #[must_use]
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (String, StagedStatus, i64)>,
    {
        let mut stats = Self::default();
        for (source_id, status, count) in groups {
            match status {
                StagedStatus::Pending => stats.pending += count,
                StagedStatus::Approved => stats.approved += count,
                StagedStatus::Rejected => stats.rejected += count,
            }
            stats.by_source.entry(source_id).or_default().add(status, count);
        }
        stats
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.pending + self.approved + self.rejected
    }
}
