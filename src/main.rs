//! Condo-Harvest main entry point
//!
//! This is the command-line interface for the Condo-Harvest property data
//! collector.

use anyhow::{bail, Context};
use clap::Parser;
use condo_harvest::collector::collect;
use condo_harvest::config::{load_config_with_hash, validate, Config};
use condo_harvest::output::{print_summary, write_reports};
use condo_harvest::sources::build_adapters;
use condo_harvest::ConfigError;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Condo-Harvest: a resilient multi-source property data collector
///
/// Condo-Harvest queries municipal portals, the IBGE statistics API, registry
/// offices and real-estate marketplaces once each, tolerates any of them
/// being down, and writes a JSON export, CSV extracts and a Markdown report.
#[derive(Parser, Debug)]
#[command(name = "condo-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient multi-source property data collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in Maceió sources if omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show which sources would be queried
    #[arg(long)]
    dry_run: bool,

    /// Write artifacts here instead of the configured directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The log file may come from the configuration, so load it first
    let loaded = load(cli.config.as_deref());
    let log_file = cli.log_file.clone().or_else(|| {
        loaded
            .as_ref()
            .ok()
            .and_then(|(config, _)| config.logging.file.as_ref().map(PathBuf::from))
    });
    setup_logging(cli.verbose, cli.quiet, log_file.as_deref());

    let (mut config, config_hash) = match loaded {
        Ok((config, hash)) => {
            match &hash {
                Some(hash) => tracing::info!("Configuration loaded successfully (hash: {})", hash),
                None => tracing::info!("No configuration file given, using built-in sources"),
            }
            (config, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e).context("invalid configuration");
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_collect(&config, config_hash).await
}

fn load(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            Ok((config, Some(hash)))
        }
        None => Ok((Config::default(), None)),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("condo_harvest=info,warn"),
            1 => EnvFilter::new("condo_harvest=debug,info"),
            2 => EnvFilter::new("condo_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Handles the --dry-run mode: shows what would be queried
fn handle_dry_run(config: &Config) {
    println!("=== Condo-Harvest Dry Run ===\n");

    println!("Collector Configuration:");
    println!(
        "  City: {} ({})",
        config.collector.city, config.collector.state
    );
    println!(
        "  Default timeout: {}s",
        config.collector.default_timeout_secs
    );
    println!(
        "  Parallel sources: {}",
        config.collector.max_parallel_sources
    );
    println!(
        "  Marketplace interval: {}ms",
        config.marketplace.interval_ms
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  CSV extracts: {}", config.tabular_sources().join(", "));

    let adapters = build_adapters(config);
    println!("\nSources ({}):", adapters.len());
    for adapter in &adapters {
        println!("  - {} [{}] {}", adapter.id(), adapter.kind(), adapter.label());
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would query {} sources", adapters.len());
}

/// Handles the main collection run
async fn handle_collect(config: &Config, config_hash: Option<String>) -> anyhow::Result<()> {
    tracing::info!(
        "Collecting property data for {} ({})",
        config.collector.city,
        config.collector.state
    );

    let mut aggregate = collect(config)
        .await
        .context("could not start the collection")?;
    if let Some(hash) = config_hash {
        aggregate = aggregate.with_config_hash(hash);
    }

    let outcome = write_reports(
        &aggregate,
        Path::new(&config.output.directory),
        &config.tabular_sources(),
    );
    print_summary(&aggregate, &outcome);

    let meta = aggregate.metadata();
    if meta.failed_source_count == meta.source_count && outcome.all_failed() {
        tracing::error!("Every source failed and no artifact could be written");
        bail!("nothing was collected and no report was written");
    }

    tracing::info!(
        "Run completed: {}/{} sources active, {} records",
        meta.active_source_count,
        meta.source_count,
        meta.total_record_count
    );

    Ok(())
}
