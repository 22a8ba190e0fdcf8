//! Collection orchestration
//!
//! This module drives a run:
//! - Building the adapters and shared collaborators from configuration
//! - Querying every source once, sequentially or with bounded parallelism
//! - Merging the per-source results into one aggregate

mod aggregator;
mod coordinator;

pub use aggregator::{aggregate, Aggregate, Metadata};
pub use coordinator::Orchestrator;

use crate::config::Config;
use crate::HarvestError;
use chrono::Utc;

/// Runs a complete collection
///
/// Builds the HTTP client, queries every enabled source and aggregates the
/// results. Source failures are part of the aggregate, not errors.
///
/// # Arguments
///
/// * `config` - The validated configuration
///
/// # Returns
///
/// * `Ok(Aggregate)` - The run completed
/// * `Err(HarvestError)` - The HTTP client could not be built
pub async fn collect(config: &Config) -> Result<Aggregate, HarvestError> {
    let orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.run().await;
    Ok(aggregate(results, Utc::now()).with_city(config.collector.city.as_str()))
}
