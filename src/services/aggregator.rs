// src/services/aggregator.rs

//! Job count aggregator.
//!
//! Runs the query plan (keyword group x postcode) against a job source,
//! pages through each search up to a bound, classifies every item by recency
//! and accumulates per-postcode counts.
//!
//! A failing (group, postcode) pair contributes nothing and the run moves on;
//! only an unreachable source aborts. Sessions are closed on every exit path.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{
    AggregationConfig, CountPolicy, JobCountReport, PoaCount, Postcode, Recency, ResultItem,
};
use crate::services::recency::classify;
use crate::services::resolver::PostcodeUniverse;
use crate::services::source::{JobSource, JobSourceFactory};

/// Per-postcode running totals for one run (or one worker's share of it).
#[derive(Debug, Clone)]
pub struct CountAccumulator {
    policy: CountPolicy,
    counts: BTreeMap<Postcode, u64>,
    seen: HashMap<Postcode, HashSet<String>>,
}

impl CountAccumulator {
    /// Start every postcode of the universe at zero.
    pub fn new(policy: CountPolicy, universe: &PostcodeUniverse) -> Self {
        Self {
            policy,
            counts: universe.iter().map(|p| (p.clone(), 0)).collect(),
            seen: HashMap::new(),
        }
    }

    /// Add within-window items found for a postcode. Returns how many were counted.
    pub fn record(&mut self, postcode: &Postcode, items: &[ResultItem]) -> u64 {
        let added = match self.policy {
            CountPolicy::RawSum => items.len() as u64,
            CountPolicy::DedupAcrossGroups => {
                let seen = self.seen.entry(postcode.clone()).or_default();
                items
                    .iter()
                    .filter(|item| seen.insert(item.identity()))
                    .count() as u64
            }
        };
        *self.counts.entry(postcode.clone()).or_insert(0) += added;
        added
    }

    pub fn count(&self, postcode: &Postcode) -> Option<u64> {
        self.counts.get(postcode).copied()
    }

    /// Fold in another worker's accumulator. Workers must own disjoint postcodes.
    pub fn merge(&mut self, other: CountAccumulator) -> Result<()> {
        for (postcode, count) in other.counts {
            if self.counts.contains_key(&postcode) {
                return Err(AppError::validation(format!(
                    "postcode {postcode} was counted by more than one worker"
                )));
            }
            self.counts.insert(postcode, count);
        }
        self.seen.extend(other.seen);
        Ok(())
    }

    pub fn into_per_poa(self) -> BTreeMap<Postcode, PoaCount> {
        self.counts
            .into_iter()
            .map(|(postcode, count)| (postcode, PoaCount { count }))
            .collect()
    }
}

/// Counters describing a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub pairs_total: usize,
    pub pairs_failed: usize,
    pub pages_visited: usize,
    pub items_seen: usize,
    pub items_within: usize,
    pub items_unclassified: usize,
    pub items_counted: u64,
}

impl AggregateStats {
    fn merge(&mut self, other: &AggregateStats) {
        self.pairs_total += other.pairs_total;
        self.pairs_failed += other.pairs_failed;
        self.pages_visited += other.pages_visited;
        self.items_seen += other.items_seen;
        self.items_within += other.items_within;
        self.items_unclassified += other.items_unclassified;
        self.items_counted += other.items_counted;
    }
}

/// Result of an aggregation run.
#[derive(Debug, Clone)]
pub struct CountOutcome {
    pub counts: CountAccumulator,
    pub stats: AggregateStats,
    pub sources: Vec<String>,
    /// Whether every session narrowed results with the source's own filter
    pub recency_filter_applied: bool,
}

impl CountOutcome {
    fn merge(&mut self, other: CountOutcome) -> Result<()> {
        self.counts.merge(other.counts)?;
        self.stats.merge(&other.stats);
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
        self.recency_filter_applied &= other.recency_filter_applied;
        Ok(())
    }

    /// Build the report document.
    pub fn into_report(self, window_days: u32, warnings: Vec<String>) -> JobCountReport {
        JobCountReport {
            generated_at_utc: Utc::now(),
            sources: self.sources,
            window_days,
            count_policy: self.counts.policy,
            warnings,
            per_poa: self.counts.into_per_poa(),
        }
    }
}

/// What one (group, postcode) pair produced.
#[derive(Debug, Default)]
struct PairResult {
    matched: Vec<ResultItem>,
    pages: usize,
    seen: usize,
    unclassified: usize,
}

/// Drives the query plan against job source sessions.
pub struct Aggregator {
    config: Arc<AggregationConfig>,
    today: NaiveDate,
}

impl Aggregator {
    pub fn new(config: Arc<AggregationConfig>) -> Self {
        Self {
            config,
            today: Utc::now().date_naive(),
        }
    }

    /// Use a fixed "today" when classifying structured posting dates.
    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run the whole plan on one session, then close it.
    pub async fn aggregate(
        &self,
        mut source: Box<dyn JobSource>,
        universe: &PostcodeUniverse,
    ) -> Result<CountOutcome> {
        let result = self.run_session(source.as_mut(), universe).await;
        if let Err(e) = source.close().await {
            log::warn!("Failed to close {} session: {}", source.name(), e);
        }
        result
    }

    /// Split the universe across `workers` sessions, each opened from `factory`.
    pub async fn aggregate_parallel(
        &self,
        factory: &dyn JobSourceFactory,
        universe: &PostcodeUniverse,
    ) -> Result<CountOutcome> {
        let parts = universe.partition(self.config.workers);
        if parts.len() <= 1 {
            return self.aggregate(factory.open().await?, universe).await;
        }

        log::info!(
            "Running {} workers over {} postcodes",
            parts.len(),
            universe.len()
        );

        // Every worker runs to completion so each session gets closed.
        let results: Vec<Result<CountOutcome>> = stream::iter(parts.iter())
            .map(|part| async move {
                let session = factory.open().await?;
                self.aggregate(session, part).await
            })
            .buffer_unordered(self.config.workers)
            .collect()
            .await;

        let mut results = results.into_iter();
        let mut merged = results
            .next()
            .ok_or_else(|| AppError::config("no worker produced counts"))??;
        for result in results {
            merged.merge(result?)?;
        }
        Ok(merged)
    }

    async fn run_session(
        &self,
        source: &mut dyn JobSource,
        universe: &PostcodeUniverse,
    ) -> Result<CountOutcome> {
        let name = source.name().to_string();

        self.step(&name, source.navigate_to_search())
            .await
            .map_err(|e| match e {
                AppError::SourceUnavailable(_) => e,
                other => AppError::source_unavailable(other),
            })?;

        let window_days = self.config.window_days;
        let recency_filter_applied =
            match self.step(&name, source.apply_recency_filter(window_days)).await {
                Ok(true) => {
                    log::debug!("{name}: recency filter set to {window_days} days");
                    true
                }
                Ok(false) => {
                    log::info!(
                        "{name}: no recency filter available, classifying every item instead"
                    );
                    false
                }
                Err(e) => {
                    log::warn!("{name}: recency filter failed ({e}), classifying every item instead");
                    false
                }
            };

        let mut counts = CountAccumulator::new(self.config.count_policy, universe);
        let mut stats = AggregateStats::default();
        let delay = Duration::from_millis(self.config.request_delay_ms);

        for group in &self.config.keyword_groups {
            let query = group.query();
            for postcode in universe.iter() {
                stats.pairs_total += 1;
                match self.fetch_pair(source, &query, postcode).await {
                    Ok(pair) => {
                        stats.pages_visited += pair.pages;
                        stats.items_seen += pair.seen;
                        stats.items_within += pair.matched.len();
                        stats.items_unclassified += pair.unclassified;
                        stats.items_counted += counts.record(postcode, &pair.matched);
                    }
                    Err(e) => {
                        stats.pairs_failed += 1;
                        log::warn!("Query failed for {} / {}: {}", group.name, postcode, e);
                    }
                }

                if delay.as_millis() > 0 {
                    tokio::time::sleep(delay).await;
                }
            }
            log::debug!("Finished keyword group {}", group.name);
        }

        Ok(CountOutcome {
            counts,
            stats,
            sources: vec![name],
            recency_filter_applied,
        })
    }

    /// Search one pair and page through it. Any error discards the whole pair.
    async fn fetch_pair(
        &self,
        source: &mut dyn JobSource,
        query: &str,
        postcode: &Postcode,
    ) -> Result<PairResult> {
        let context = format!("{} @ {}", source.name(), postcode);
        let max_pages = self.config.max_pages.max(1);
        let mut pair = PairResult::default();

        self.step(&context, source.search(query, postcode.as_str()))
            .await?;

        for page_index in 0..max_pages {
            self.settle().await;
            let items = self.step(&context, source.list_result_items()).await?;
            pair.pages += 1;
            if items.is_empty() {
                break;
            }

            for item in items {
                pair.seen += 1;
                match classify(&item, self.config.window_days, self.today) {
                    Recency::Within => pair.matched.push(item),
                    Recency::Outside => {}
                    Recency::Unclassified => pair.unclassified += 1,
                }
            }

            if page_index + 1 == max_pages {
                break;
            }
            // A broken next control just ends pagination.
            let has_next = self
                .step(&context, source.has_next_page())
                .await
                .unwrap_or(false);
            if !has_next {
                break;
            }
            self.step(&context, source.go_to_next_page()).await?;
        }

        Ok(pair)
    }

    /// Wait for the source to finish rendering before reading it.
    async fn settle(&self) {
        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }
    }

    /// Bound a single source step by the configured timeout.
    async fn step<T>(&self, context: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let secs = self.config.step_timeout_secs.max(1);
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::query(context, format!("timed out after {secs}s"))),
        }
    }
}
