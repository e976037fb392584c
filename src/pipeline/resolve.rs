// src/pipeline/resolve.rs

use crate::error::Result;
use crate::models::PathsConfig;
use crate::services::{Resolution, resolve};
use crate::storage::DocumentStorage;

/// Resolve the rules document in place.
pub async fn run_resolve(paths: &PathsConfig, storage: &dyn DocumentStorage) -> Result<Resolution> {
    let rules = storage.load_rules(&paths.rules_file).await?;
    let resolution = resolve(&rules)?;
    storage
        .save_rules(&paths.rules_file, &resolution.document)
        .await?;

    log::info!("Rules document updated: {}", paths.rules_file);
    Ok(resolution)
}
