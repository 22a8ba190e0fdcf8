//! Source adapters and the capabilities they share
//!
//! This module contains everything that talks to the outside world:
//! - The fetch capability and its `reqwest` implementation
//! - HTML and JSON extraction helpers
//! - Request pacing per host and per source
//! - One adapter per kind of source (portal, statistics API, registry list,
//!   marketplace pages)
//!
//! Adapters never fail: whatever happens on the network is folded into the
//! `SourceResult` they return.

mod fetcher;
mod limiter;
mod marketplace;
mod parser;
mod portal;
mod registry;
mod statistics;

pub use fetcher::{build_http_client, FetchResponse, Fetcher, HttpFetcher};
pub use limiter::{PaceKey, RateLimiter};
pub use marketplace::MarketplaceAdapter;
pub use parser::{
    contains_keyword, count_keyword_containers, find_keyword_links, find_named_inputs, lookup,
    lookup_field, normalize_keywords, page_title, parse_json, InputDescriptor, KeywordLink,
};
pub use portal::PortalAdapter;
pub use registry::RegistryAdapter;
pub use statistics::StatisticsAdapter;

use crate::config::Config;
use crate::model::{SourceError, SourceResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The kind of source an adapter handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// HTML portal scanned for links and form fields
    Portal,

    /// JSON statistics API
    Statistics,

    /// Curated list of registry offices
    Registry,

    /// Real-estate marketplace listing pages
    Marketplace,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portal => "portal",
            Self::Statistics => "statistics",
            Self::Registry => "registry",
            Self::Marketplace => "marketplace",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared collaborators handed to every adapter
#[derive(Clone)]
pub struct CollectContext {
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<RateLimiter>,
}

impl CollectContext {
    pub fn new(fetcher: Arc<dyn Fetcher>, limiter: Arc<RateLimiter>) -> Self {
        Self { fetcher, limiter }
    }

    /// Paced GET that only accepts HTTP 200
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - The source answered with 200
    /// * `Err(SourceError::UnexpectedStatus)` - Any other status
    /// * `Err(SourceError::TransportFailure)` - No response at all
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, SourceError> {
        self.paced_get(&[PaceKey::host(url)], url, timeout).await
    }

    /// Like [`get`](Self::get), but also paced by the issuing source
    pub async fn get_for_source(
        &self,
        source_id: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, SourceError> {
        let keys = [PaceKey::source(source_id), PaceKey::host(url)];
        self.paced_get(&keys, url, timeout).await
    }

    // Keys are always acquired source first, then host
    async fn paced_get(
        &self,
        keys: &[PaceKey],
        url: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, SourceError> {
        for key in keys {
            self.limiter.acquire(key).await;
        }
        let result = self.fetcher.fetch(url, timeout).await;
        for key in keys {
            self.limiter.complete(key).await;
        }

        let response = result?;
        tracing::debug!(
            "GET {} -> {} ({})",
            response.final_url,
            response.status_code,
            if response.content_type.is_empty() {
                "no content type"
            } else {
                response.content_type.as_str()
            }
        );
        if response.status_code != 200 {
            return Err(SourceError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status_code,
            });
        }

        Ok(response)
    }
}

/// One external data provider
///
/// Implementations must not panic or return early with an error: every
/// failure ends up in the returned `SourceResult`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable source identifier, used as the aggregate key
    fn id(&self) -> &str;

    /// Human readable name
    fn label(&self) -> &str;

    /// Which kind of source this is
    fn kind(&self) -> AdapterKind;

    /// Queries the source once
    async fn collect(&self, ctx: &CollectContext) -> SourceResult;
}

/// Builds the enabled adapters in run order: portals as listed, then the
/// statistics API, the registry list and the marketplaces
pub fn build_adapters(config: &Config) -> Vec<Arc<dyn SourceAdapter>> {
    let collector = &config.collector;
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    for portal in config.portals.iter().filter(|p| p.enabled) {
        let timeout = collector.timeout(portal.timeout_secs);
        adapters.push(Arc::new(PortalAdapter::new(portal.clone(), timeout)));
    }

    if config.statistics.enabled {
        let timeout = collector.timeout(config.statistics.timeout_secs);
        adapters.push(Arc::new(StatisticsAdapter::new(
            config.statistics.clone(),
            timeout,
        )));
    }

    if config.registry.enabled {
        let timeout = collector.timeout(config.registry.timeout_secs);
        adapters.push(Arc::new(RegistryAdapter::new(config.registry.clone(), timeout)));
    }

    if config.marketplace.enabled {
        let timeout = collector.timeout(config.marketplace.timeout_secs);
        adapters.push(Arc::new(MarketplaceAdapter::new(
            config.marketplace.clone(),
            &collector.city,
            timeout,
        )));
    }

    adapters
}

/// Builds the limiter: the collector default on every host, the marketplace
/// interval between successive requests of the marketplace source
pub fn build_rate_limiter(config: &Config) -> RateLimiter {
    let mut limiter =
        RateLimiter::new(Duration::from_millis(config.collector.default_interval_ms));

    if config.marketplace.enabled {
        limiter = limiter.with_source_interval(
            &config.marketplace.id,
            Duration::from_millis(config.marketplace.interval_ms),
        );
    }

    limiter
}
