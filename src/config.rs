// src/config.rs

//! Configuration loading utilities.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Load configuration from a TOML file and validate it.
///
/// A missing or unreadable file falls back to defaults with a warning; an
/// invalid configuration is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path);
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid config {}: {e}", path.display())))?;
    Ok(config)
}
