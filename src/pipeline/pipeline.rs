// src/pipeline/pipeline.rs

use crate::error::Result;
use crate::models::{Config, JobCountReport};
use crate::services::JobSourceFactory;
use crate::storage::DocumentStorage;

use super::count::run_count;
use super::resolve::run_resolve;

/// Run the full pipeline: resolve the rules document, then count.
pub async fn run_pipeline(
    config: &Config,
    storage: &dyn DocumentStorage,
    factory: &dyn JobSourceFactory,
    skip_resolve: bool,
) -> Result<JobCountReport> {
    let total_steps = if skip_resolve { 1 } else { 2 };
    let mut current_step = 1;

    if skip_resolve {
        log::info!(
            "Skipping resolve, using flat sets already in {}",
            config.paths.rules_file
        );
    } else {
        log::info!("[STEP {current_step}/{total_steps}] Resolve - Expanding postcode ranges");
        run_resolve(&config.paths, storage).await?;
        current_step += 1;
    }

    log::info!("[STEP {current_step}/{total_steps}] Count - Querying job source");
    let report = run_count(config, storage, factory).await?;

    log::info!("Pipeline complete: {} postings counted", report.total());
    Ok(report)
}
