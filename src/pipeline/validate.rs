// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::{PostcodeUniverse, resolve};
use crate::storage::DocumentStorage;

/// What a dry run of the resolver found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub regional_count: usize,
    pub remote_count: usize,
    pub universe_size: usize,
    pub unresolved: Vec<String>,
}

/// Validate the config and dry-run the resolver. Nothing is written.
pub async fn run_validate(
    config: &Config,
    storage: &dyn DocumentStorage,
) -> Result<ValidationSummary> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!(
        "Config OK: {} keyword groups, window {} days, {} worker(s)",
        config.aggregation.keyword_groups.len(),
        config.aggregation.window_days,
        config.aggregation.workers
    );

    let rules = storage.load_rules(&config.paths.rules_file).await?;
    let resolution = match resolve(&rules) {
        Ok(resolution) => resolution,
        Err(e) => {
            log::error!("Rules validation failed: {}", e);
            return Err(e);
        }
    };
    let universe = PostcodeUniverse::from_rules(&resolution.document)?;

    let summary = ValidationSummary {
        regional_count: resolution.regional_flat.len(),
        remote_count: resolution.remote_flat.len(),
        universe_size: universe.len(),
        unresolved: resolution
            .unresolved
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    log::info!(
        "Rules OK: {} regional, {} remote/very remote, {} postcodes to query",
        summary.regional_count,
        summary.remote_count,
        summary.universe_size
    );
    Ok(summary)
}
