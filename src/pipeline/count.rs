// src/pipeline/count.rs

//! Job counting pipeline.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, JobCountReport};
use crate::services::{
    Aggregator, CountOutcome, JobSourceFactory, PostcodeUniverse, unresolved_regions,
};
use crate::storage::DocumentStorage;

/// Count postings for every postcode of the resolved rules and write the report.
///
/// Nothing is written when the run fails.
pub async fn run_count(
    config: &Config,
    storage: &dyn DocumentStorage,
    factory: &dyn JobSourceFactory,
) -> Result<JobCountReport> {
    let start_time = Utc::now();

    let rules = storage.load_rules(&config.paths.rules_file).await?;
    let universe = PostcodeUniverse::from_rules(&rules)?;
    let warnings: Vec<String> = unresolved_regions(&rules)?
        .iter()
        .map(ToString::to_string)
        .collect();

    let groups = config.aggregation.keyword_groups.len();
    log::info!(
        "Counting {} keyword groups across {} postcodes ({} queries, window {} days)",
        groups,
        universe.len(),
        groups * universe.len(),
        config.aggregation.window_days
    );

    let aggregator = Aggregator::new(Arc::new(config.aggregation.clone()));
    let outcome = aggregator.aggregate_parallel(factory, &universe).await?;
    for line in run_summary(&outcome, (Utc::now() - start_time).num_seconds()) {
        log::info!("{line}");
    }

    let report = outcome.into_report(config.aggregation.window_days, warnings);
    let meta = storage
        .write_report(&config.paths.report_file, &report)
        .await?;

    log::info!(
        "Report written to {} at {} ({} postcodes, {} postings)",
        meta.location,
        meta.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        meta.entry_count,
        report.total()
    );

    Ok(report)
}

/// Summary lines logged at the end of a run.
fn run_summary(outcome: &CountOutcome, elapsed_secs: i64) -> Vec<String> {
    let stats = &outcome.stats;
    vec![
        format!(
            "Queries: {} run, {} failed; {} pages visited in {}s",
            stats.pairs_total, stats.pairs_failed, stats.pages_visited, elapsed_secs
        ),
        format!(
            "Items: {} seen, {} within window, {} counted, {} unclassified",
            stats.items_seen, stats.items_within, stats.items_counted, stats.items_unclassified
        ),
        if outcome.recency_filter_applied {
            "Recency filter: applied by the source".to_string()
        } else {
            "Recency filter: not applied, every item classified locally".to_string()
        },
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::models::rules::tests::sample_json;
    use crate::models::{KeywordGroup, Postcode, ResultItem};
    use crate::services::JobSource;
    use crate::storage::LocalStorage;

    /// Serves the same page for every search.
    pub(crate) struct FixedSource {
        items: Vec<ResultItem>,
        reachable: bool,
    }

    #[async_trait]
    impl JobSource for FixedSource {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn navigate_to_search(&mut self) -> Result<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(AppError::source_unavailable("offline"))
            }
        }

        async fn apply_recency_filter(&mut self, _window_days: u32) -> Result<bool> {
            Ok(true)
        }

        async fn search(&mut self, _keyword_query: &str, _location_query: &str) -> Result<()> {
            Ok(())
        }

        async fn list_result_items(&mut self) -> Result<Vec<ResultItem>> {
            Ok(self.items.clone())
        }

        async fn has_next_page(&mut self) -> Result<bool> {
            Ok(false)
        }

        async fn go_to_next_page(&mut self) -> Result<()> {
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    pub(crate) struct FixedFactory {
        pub(crate) texts: Vec<&'static str>,
        pub(crate) reachable: bool,
        pub(crate) opened: Mutex<usize>,
    }

    impl FixedFactory {
        pub(crate) fn new(texts: &[&'static str]) -> Self {
            Self {
                texts: texts.to_vec(),
                reachable: true,
                opened: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl JobSourceFactory for FixedFactory {
        async fn open(&self) -> Result<Box<dyn JobSource>> {
            *self.opened.lock().unwrap() += 1;
            Ok(Box::new(FixedSource {
                items: self.texts.iter().map(|t| ResultItem::from_text(*t)).collect(),
                reachable: self.reachable,
            }))
        }
    }

    pub(crate) fn test_config() -> Config {
        let mut config = Config::default();
        config.aggregation.settle_delay_ms = 0;
        config.aggregation.keyword_groups = vec![KeywordGroup::new("farm", &["farm", "harvest"])];
        config
    }

    pub(crate) fn seeded_storage(tmp: &TempDir, config: &Config) -> LocalStorage {
        let rules = tmp.path().join(&config.paths.rules_file);
        std::fs::create_dir_all(rules.parent().unwrap()).unwrap();
        std::fs::write(rules, sample_json()).unwrap();
        LocalStorage::new(tmp.path())
    }

    #[test]
    fn test_run_summary_reports_recency_filter() {
        use crate::models::CountPolicy;
        use crate::services::{AggregateStats, CountAccumulator};

        let mut outcome = CountOutcome {
            counts: CountAccumulator::new(CountPolicy::RawSum, &PostcodeUniverse::default()),
            stats: AggregateStats {
                pairs_total: 10,
                pairs_failed: 2,
                ..AggregateStats::default()
            },
            sources: vec!["Fixed".into()],
            recency_filter_applied: false,
        };
        let lines = run_summary(&outcome, 7);
        assert_eq!(lines[0], "Queries: 10 run, 2 failed; 0 pages visited in 7s");
        assert!(lines[2].contains("not applied"));

        outcome.recency_filter_applied = true;
        assert_eq!(run_summary(&outcome, 7)[2], "Recency filter: applied by the source");
    }

    #[tokio::test]
    async fn test_count_requires_resolved_rules() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let storage = seeded_storage(&tmp, &config);

        let result = run_count(&config, &storage, &FixedFactory::new(&[])).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_source_writes_no_report() {
        let tmp = TempDir::new().unwrap();
        let config = test_config();
        let storage = seeded_storage(&tmp, &config);
        crate::pipeline::run_resolve(&config.paths, &storage)
            .await
            .unwrap();

        let factory = FixedFactory {
            reachable: false,
            ..FixedFactory::new(&["1 day ago"])
        };
        let result = run_count(&config, &storage, &factory).await;

        assert!(matches!(result, Err(AppError::SourceUnavailable(_))));
        assert!(!tmp.path().join(&config.paths.report_file).exists());
    }

    #[tokio::test]
    async fn test_count_writes_report_with_gap_warnings() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config();
        config.aggregation.workers = 3;
        let storage = seeded_storage(&tmp, &config);
        crate::pipeline::run_resolve(&config.paths, &storage)
            .await
            .unwrap();

        let factory = FixedFactory::new(&["Added 1 day ago", "Added 40 days ago"]);
        let report = run_count(&config, &storage, &factory).await.unwrap();

        assert_eq!(report.per_poa.len(), 13);
        assert!(report.per_poa.values().all(|c| c.count == 1));
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.window_days, 10);
        assert_eq!(*factory.opened.lock().unwrap(), 3);

        let stored = storage
            .load_report(&config.paths.report_file)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.per_poa, report.per_poa);
        assert_eq!(
            stored.per_poa[&Postcode::parse("0800").unwrap()].count,
            1
        );
    }
}
