//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CountPolicy, KeywordGroup};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Input and output document locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Job source connection and page structure
    #[serde(default)]
    pub source: SourceConfig,

    /// Query plan and counting behavior
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.search_url.trim().is_empty() {
            return Err(AppError::validation("source.search_url is empty"));
        }
        url::Url::parse(&self.source.search_url)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.selectors.item.trim().is_empty() {
            return Err(AppError::validation("source.selectors.item is empty"));
        }
        if self.aggregation.window_days == 0 {
            return Err(AppError::validation("aggregation.window_days must be > 0"));
        }
        if self.aggregation.max_pages == 0 {
            return Err(AppError::validation("aggregation.max_pages must be > 0"));
        }
        if self.aggregation.step_timeout_secs == 0 {
            return Err(AppError::validation(
                "aggregation.step_timeout_secs must be > 0",
            ));
        }
        if self.aggregation.workers == 0 {
            return Err(AppError::validation("aggregation.workers must be > 0"));
        }
        if self.aggregation.keyword_groups.is_empty() {
            return Err(AppError::validation("No keyword groups defined"));
        }
        if let Some(group) = self
            .aggregation
            .keyword_groups
            .iter()
            .find(|g| g.query().is_empty())
        {
            return Err(AppError::validation(format!(
                "Keyword group '{}' has no terms",
                group.name
            )));
        }
        Ok(())
    }
}

/// Document locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Eligibility rules document (read and rewritten by the resolver)
    #[serde(default = "defaults::rules_file")]
    pub rules_file: String,

    /// Job count report written by the aggregator
    #[serde(default = "defaults::report_file")]
    pub report_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules_file: defaults::rules_file(),
            report_file: defaults::report_file(),
        }
    }
}

/// Job source settings for the HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source name recorded in the report
    #[serde(default = "defaults::source_name")]
    pub name: String,

    /// Search page URL
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Query parameter carrying the keyword query
    #[serde(default = "defaults::keyword_param")]
    pub keyword_param: String,

    /// Query parameter carrying the location (postcode)
    #[serde(default = "defaults::location_param")]
    pub location_param: String,

    /// Query parameter for the source's own job-age filter, if it has one
    #[serde(default = "defaults::recency_param")]
    pub recency_param: Option<String>,

    /// Job-age filter values the source accepts
    #[serde(default = "defaults::recency_options")]
    pub recency_options: Vec<RecencyOption>,

    /// Where things live on a results page
    #[serde(default)]
    pub selectors: SourceSelectors,
}

impl SourceConfig {
    /// Narrowest filter option that still covers `window_days`.
    pub fn recency_option_for(&self, window_days: u32) -> Option<&RecencyOption> {
        self.recency_options
            .iter()
            .filter(|o| o.max_days >= window_days)
            .min_by_key(|o| o.max_days)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: defaults::source_name(),
            search_url: defaults::search_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            keyword_param: defaults::keyword_param(),
            location_param: defaults::location_param(),
            recency_param: defaults::recency_param(),
            recency_options: defaults::recency_options(),
            selectors: SourceSelectors::default(),
        }
    }
}

/// A value of the source's job-age filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyOption {
    /// Oldest posting age (days) the option lets through
    pub max_days: u32,

    /// Query parameter value
    pub value: String,
}

/// CSS selectors for a results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSelectors {
    /// One element per result card
    #[serde(default = "defaults::item_selector")]
    pub item: String,

    /// Element inside a card holding the recency text (whole card if unset)
    #[serde(default)]
    pub recency: Option<String>,

    /// Element inside a card carrying a machine-readable date
    #[serde(default = "defaults::posted_date_selector")]
    pub posted_date: Option<String>,

    /// Attribute of `posted_date` holding the date
    #[serde(default = "defaults::posted_date_attr")]
    pub posted_date_attr: String,

    /// Link inside a card identifying the posting
    #[serde(default = "defaults::link_selector")]
    pub link: Option<String>,

    /// The "next page" control
    #[serde(default = "defaults::next_page_selector")]
    pub next_page: String,
}

impl Default for SourceSelectors {
    fn default() -> Self {
        Self {
            item: defaults::item_selector(),
            recency: None,
            posted_date: defaults::posted_date_selector(),
            posted_date_attr: defaults::posted_date_attr(),
            link: defaults::link_selector(),
            next_page: defaults::next_page_selector(),
        }
    }
}

/// Query plan and counting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Oldest posting age (days) that is counted
    #[serde(default = "defaults::window_days")]
    pub window_days: u32,

    /// Page bound per (keyword group, postcode) pair
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Wait before reading results after each navigation
    #[serde(default = "defaults::settle_delay")]
    pub settle_delay_ms: u64,

    /// Timeout for each individual source step
    #[serde(default = "defaults::step_timeout")]
    pub step_timeout_secs: u64,

    /// Pause between (keyword group, postcode) pairs
    #[serde(default)]
    pub request_delay_ms: u64,

    /// Concurrent workers, each with its own source session
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Cross-group counting policy
    #[serde(default)]
    pub count_policy: CountPolicy,

    /// Industry keyword groups
    #[serde(default = "defaults::keyword_groups")]
    pub keyword_groups: Vec<KeywordGroup>,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
            max_pages: defaults::max_pages(),
            settle_delay_ms: defaults::settle_delay(),
            step_timeout_secs: defaults::step_timeout(),
            request_delay_ms: 0,
            workers: defaults::workers(),
            count_policy: CountPolicy::default(),
            keyword_groups: defaults::keyword_groups(),
        }
    }
}

mod defaults {
    use super::{KeywordGroup, RecencyOption};

    // Path defaults
    pub fn rules_file() -> String {
        "rules/eligibility-462.json".into()
    }
    pub fn report_file() -> String {
        "data/jobs-last10d.json".into()
    }

    // Source defaults
    pub fn source_name() -> String {
        "Workforce Australia".into()
    }
    pub fn search_url() -> String {
        "https://www.workforceaustralia.gov.au/individuals/jobs/search".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobcount/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn keyword_param() -> String {
        "searchText".into()
    }
    pub fn location_param() -> String {
        "locationSearch".into()
    }
    pub fn recency_param() -> Option<String> {
        Some("jobAge".into())
    }
    pub fn recency_options() -> Vec<RecencyOption> {
        [(3, "3"), (7, "7"), (14, "14")]
            .into_iter()
            .map(|(max_days, value)| RecencyOption {
                max_days,
                value: value.into(),
            })
            .collect()
    }
    pub fn item_selector() -> String {
        r#"[data-testid^="job-card"]"#.into()
    }
    pub fn posted_date_selector() -> Option<String> {
        Some("time[datetime]".into())
    }
    pub fn posted_date_attr() -> String {
        "datetime".into()
    }
    pub fn link_selector() -> Option<String> {
        Some("a[href]".into())
    }
    pub fn next_page_selector() -> String {
        r#"a[rel="next"], a[aria-label="Next"], button[aria-label="Next"]"#.into()
    }

    // Aggregation defaults
    pub fn window_days() -> u32 {
        10
    }
    pub fn max_pages() -> usize {
        5
    }
    pub fn settle_delay() -> u64 {
        1500
    }
    pub fn step_timeout() -> u64 {
        20
    }
    pub fn workers() -> usize {
        1
    }

    pub fn keyword_groups() -> Vec<KeywordGroup> {
        vec![
            KeywordGroup::new(
                "tourism_hospitality",
                &[
                    "hotel", "hostel", "motel", "resort", "reception", "housekeeping", "bar",
                    "restaurant", "cafe", "chef", "cook", "waiter", "bartender", "tour", "guide",
                    "museum", "gallery",
                ],
            ),
            KeywordGroup::new(
                "plant_animal_cultivation",
                &[
                    "farm", "orchard", "harvest", "picker", "packing", "vineyard", "pruning",
                    "vegetable", "fruit", "cattle", "shear", "dairy",
                ],
            ),
            KeywordGroup::new(
                "construction",
                &[
                    "construction", "labourer", "carpenter", "plumber", "electrician", "painter",
                    "tiler", "bricklayer", "concretor", "scaffolder",
                ],
            ),
            KeywordGroup::new(
                "fishing_pearling_forestry",
                &["fishing", "deckhand", "pearling", "forestry", "logging", "tree felling"],
            ),
            KeywordGroup::new(
                "disaster_recovery",
                &["recovery", "disaster", "clean-up", "restoration", "reconstruction"],
            ),
        ]
    }
}
