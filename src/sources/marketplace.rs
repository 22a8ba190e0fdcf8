//! Real-estate marketplace adapter
//!
//! Each configured listing page is fetched once. The first few container
//! elements are inspected and those mentioning a domain keyword (apartment,
//! condominium, building, the city name) are counted. Successive site
//! requests are spaced by the source interval, whatever each outcome.

use crate::config::MarketplaceConfig;
use crate::model::{
    Record, RecordKind, SourceError, SourceResult, SourceResultBuilder, FIELD_KIND, FIELD_SOURCE,
    FIELD_URL,
};
use crate::sources::parser::{count_keyword_containers, normalize_keywords};
use crate::sources::{AdapterKind, CollectContext, SourceAdapter};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

/// Adapter for the marketplace listing pages
#[derive(Debug, Clone)]
pub struct MarketplaceAdapter {
    config: MarketplaceConfig,
    keywords: Vec<String>,
    timeout: Duration,
}

impl MarketplaceAdapter {
    /// Creates the adapter; the city name joins the configured keywords
    pub fn new(config: MarketplaceConfig, city: &str, timeout: Duration) -> Self {
        let mut keywords = normalize_keywords(&config.keywords);
        for city_keyword in normalize_keywords(&[city]) {
            if !keywords.contains(&city_keyword) {
                keywords.push(city_keyword);
            }
        }

        Self {
            config,
            keywords,
            timeout,
        }
    }

    /// The normalized keyword set
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Counts property-related containers on a listing page
    pub fn count_listings(&self, html: &str) -> Result<usize, String> {
        count_keyword_containers(
            html,
            &self.config.container_selector,
            self.config.max_containers,
            &self.keywords,
        )
    }

    fn snapshot_record(&self, site: &str, url: &str, count: usize, status_code: u16) -> Record {
        Record::new(&self.config.id, RecordKind::MarketplaceSnapshot)
            .with(FIELD_SOURCE, site)
            .with(FIELD_KIND, "portal_imobiliario")
            .with(FIELD_URL, url)
            .with("imoveis_detectados", count)
            .with("status_http", status_code)
            .with("data_acesso", Utc::now().to_rfc3339())
    }
}

#[async_trait]
impl SourceAdapter for MarketplaceAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn label(&self) -> &str {
        &self.config.label
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Marketplace
    }

    async fn collect(&self, ctx: &CollectContext) -> SourceResult {
        let mut builder = SourceResultBuilder::new(&self.config.id);

        for site in &self.config.sites {
            tracing::info!("[{}] Checking {} ({})", self.config.id, site.name, site.url);

            let response = match ctx
                .get_for_source(&self.config.id, &site.url, self.timeout)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    builder.failed(e);
                    continue;
                }
            };

            match self.count_listings(&response.body) {
                Ok(count) => {
                    tracing::info!(
                        "[{}] {}: {} property containers detected",
                        self.config.id,
                        site.name,
                        count
                    );
                    builder.succeeded();
                    builder.push(self.snapshot_record(
                        &site.name,
                        &site.url,
                        count,
                        response.status_code,
                    ));
                }
                Err(message) => builder.failed(SourceError::ParseFailure {
                    url: site.url.clone(),
                    message,
                }),
            }
        }

        builder.finish()
    }
}
