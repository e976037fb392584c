// src/models/source.rs

//! Items returned by a job source and their recency classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single search result as read from the job source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultItem {
    /// Stable posting identifier (usually the posting link), if the source exposes one
    pub id: Option<String>,

    /// Rendered text of the result card
    pub text: String,

    /// Structured publication date, if the source exposes one
    pub posted_on: Option<NaiveDate>,
}

impl ResultItem {
    /// An item with only rendered text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Key used to recognise the same posting across keyword groups.
    pub fn identity(&self) -> String {
        match &self.id {
            Some(id) => format!("id:{id}"),
            None => format!(
                "text:{}",
                self.text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
            ),
        }
    }
}

/// Outcome of classifying a posting against the recency window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Within,
    Outside,
    /// No recognised date or phrasing; never counted.
    Unclassified,
}

impl Recency {
    pub fn is_within(self) -> bool {
        self == Self::Within
    }
}

/// How postings found by several keyword groups for one postcode are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// Every match is counted, so a posting found by two groups counts twice.
    #[default]
    RawSum,
    /// A posting counts at most once per postcode.
    DedupAcrossGroups,
}
