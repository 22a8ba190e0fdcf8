//! Collection coordinator
//!
//! Runs every enabled adapter exactly once and gathers one `SourceResult` per
//! adapter, in configured order. Each adapter runs in its own tokio task so a
//! panic inside one source is turned into a failed result instead of taking
//! the run down. With `max-parallel-sources` above 1, adapters run
//! concurrently behind a semaphore; source and host pacing still apply
//! because the rate limiter is shared.

use crate::config::Config;
use crate::model::{SourceResult, SourceStatus};
use crate::sources::{
    build_adapters, build_rate_limiter, CollectContext, Fetcher, HttpFetcher, SourceAdapter,
};
use crate::HarvestError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

/// Main collection coordinator
pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    context: CollectContext,
    max_parallel_sources: usize,
}

impl Orchestrator {
    /// Creates an orchestrator for the configured sources
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::new(&config.collector.user_agent)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Creates an orchestrator for the configured sources around any fetcher
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let limiter = Arc::new(build_rate_limiter(config));
        Self::from_parts(
            build_adapters(config),
            CollectContext::new(fetcher, limiter),
            config.collector.max_parallel_sources,
        )
    }

    /// Creates an orchestrator from explicit adapters
    pub fn from_parts(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        context: CollectContext,
        max_parallel_sources: usize,
    ) -> Self {
        Self {
            adapters,
            context,
            max_parallel_sources: max_parallel_sources.max(1),
        }
    }

    /// The adapters this orchestrator will run, in order
    pub fn adapters(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Queries every source once
    ///
    /// Never fails: whatever happens to a source ends up in its result.
    /// Results are returned in adapter order regardless of completion order.
    pub async fn run(&self) -> Vec<SourceResult> {
        tracing::info!(
            "Collecting from {} sources ({} at a time)",
            self.adapters.len(),
            self.max_parallel_sources
        );

        let results = if self.max_parallel_sources == 1 {
            self.run_sequential().await
        } else {
            self.run_parallel().await
        };

        let active = results.iter().filter(|r| r.is_active()).count();
        tracing::info!(
            "Collection finished: {}/{} sources returned data",
            active,
            results.len()
        );

        results
    }

    async fn run_sequential(&self) -> Vec<SourceResult> {
        let mut results = Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            tracing::info!("Collecting {} ({})", adapter.label(), adapter.kind());

            let task_adapter = Arc::clone(adapter);
            let ctx = self.context.clone();
            let outcome = tokio::spawn(async move { task_adapter.collect(&ctx).await }).await;

            let result = settle(adapter.id(), outcome);
            log_outcome(&result);
            results.push(result);
        }

        results
    }

    async fn run_parallel(&self) -> Vec<SourceResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel_sources));

        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let ctx = self.context.clone();
                let semaphore = Arc::clone(&semaphore);

                tokio::spawn(async move {
                    // The semaphore is never closed, so acquiring cannot fail
                    let _permit = semaphore.acquire_owned().await.ok();
                    tracing::info!("Collecting {} ({})", adapter.label(), adapter.kind());
                    adapter.collect(&ctx).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (adapter, handle) in self.adapters.iter().zip(handles) {
            let result = settle(adapter.id(), handle.await);
            log_outcome(&result);
            results.push(result);
        }

        results
    }
}

/// Turns an aborted adapter task into a failed result
fn settle(source_id: &str, outcome: Result<SourceResult, JoinError>) -> SourceResult {
    match outcome {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("[{}] Collection task aborted: {}", source_id, e);
            SourceResult::failed(source_id, format!("collection task aborted: {}", e))
        }
    }
}

fn log_outcome(result: &SourceResult) {
    match result.status() {
        SourceStatus::Ok => tracing::info!(
            "{} {}: {} records in {} ms",
            result.status().marker(),
            result.source_id(),
            result.len(),
            result.duration_ms()
        ),
        SourceStatus::Partial | SourceStatus::Failed => tracing::warn!(
            "{} {}: {} with {} records ({})",
            result.status().marker(),
            result.source_id(),
            result.status(),
            result.len(),
            result.error_summary().unwrap_or("no details")
        ),
    }
}
