//! jobcount CLI
//!
//! Resolves the 462 visa postcode sets and counts recent job postings per
//! postcode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jobcount::{
    config::load_config,
    error::Result,
    pipeline,
    services::{HttpJobSourceFactory, PostcodeUniverse},
    storage::{DocumentStorage, LocalStorage},
};

/// jobcount - Regional job counter for 462 visa postcodes
#[derive(Parser, Debug)]
#[command(
    name = "jobcount",
    version,
    about = "Counts recent job postings per 462 visa eligible postcode"
)]
struct Cli {
    /// Path to the config file; document paths resolve relative to its directory
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand postcode ranges and write the flat sets into the rules document
    Resolve,

    /// Resolve, then count postings per postcode and write the report
    Count {
        /// Use the flat sets already in the rules document
        #[arg(long)]
        skip_resolve: bool,
    },

    /// Validate the config and dry-run the resolver
    Validate,

    /// Show document locations and the last report
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli.config)?;
    let base_dir = cli.config.parent().unwrap_or(Path::new("."));
    let storage = LocalStorage::new(base_dir);

    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Resolve => {
            let resolution = pipeline::run_resolve(&config.paths, &storage).await?;
            if !resolution.unresolved.is_empty() {
                log::warn!(
                    "{} region(s) marked ALL were not expanded",
                    resolution.unresolved.len()
                );
            }
        }

        Command::Count { skip_resolve } => {
            let factory = HttpJobSourceFactory::new(Arc::new(config.source.clone()));
            let report =
                pipeline::run_pipeline(&config, &storage, &factory, skip_resolve).await?;
            for warning in &report.warnings {
                log::warn!("{warning}");
            }
        }

        Command::Validate => {
            let summary = pipeline::run_validate(&config, &storage).await?;
            for gap in &summary.unresolved {
                log::warn!("{gap}");
            }
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Rules document: {}", config.paths.rules_file);
            log::info!("Report: {}", config.paths.report_file);
            log::info!("Job source: {} ({})", config.source.name, config.source.search_url);

            match storage.load_rules(&config.paths.rules_file).await {
                Ok(rules) => match PostcodeUniverse::from_rules(&rules) {
                    Ok(universe) => log::info!("Postcode universe: {} postcodes", universe.len()),
                    Err(e) => log::info!("Postcode universe: unavailable ({e})"),
                },
                Err(e) => log::warn!("Rules document unavailable: {e}"),
            }

            match storage.load_report(&config.paths.report_file).await? {
                Some(report) => {
                    log::info!("Last report: {}", report.generated_at_utc.to_rfc3339());
                    log::info!(
                        "  {} postcodes, {} postings within {} days",
                        report.per_poa.len(),
                        report.total(),
                        report.window_days
                    );
                }
                None => log::info!("Last report: none"),
            }
        }
    }

    Ok(())
}
