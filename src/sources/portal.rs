//! HTML portal adapter
//!
//! Used for the citizen portal, the IPTU system, the transparency portal and
//! the open data catalogue. The page is fetched once; every link whose label
//! mentions one of the portal's keywords becomes a record. When form
//! scanning is enabled, every named `<input>` is described as well.

use crate::config::PortalConfig;
use crate::model::{
    Record, RecordKind, SourceResult, SourceResultBuilder, FIELD_KIND, FIELD_SERVICE,
    FIELD_SOURCE, FIELD_URL,
};
use crate::sources::parser::{find_keyword_links, find_named_inputs, normalize_keywords};
use crate::sources::{AdapterKind, CollectContext, SourceAdapter};
use async_trait::async_trait;
use std::time::Duration;

/// Adapter for one HTML portal
#[derive(Debug, Clone)]
pub struct PortalAdapter {
    config: PortalConfig,
    keywords: Vec<String>,
    timeout: Duration,
}

impl PortalAdapter {
    pub fn new(config: PortalConfig, timeout: Duration) -> Self {
        let keywords = normalize_keywords(&config.keywords);
        Self {
            config,
            keywords,
            timeout,
        }
    }

    /// Turns a portal page into records
    ///
    /// # Arguments
    ///
    /// * `html` - The page body
    /// * `page_url` - Where the page was served from, for resolving links
    pub fn extract(&self, html: &str, page_url: &str) -> Vec<Record> {
        let mut records: Vec<Record> = find_keyword_links(html, page_url, &self.keywords)
            .into_iter()
            .map(|link| {
                Record::new(&self.config.id, self.config.link_kind)
                    .with(FIELD_SOURCE, self.config.label.as_str())
                    .with(FIELD_KIND, link_kind_label(self.config.link_kind))
                    .with(FIELD_SERVICE, link.label)
                    .with("href", link.href)
                    .with(FIELD_URL, link.url)
            })
            .collect();

        if self.config.scan_form_inputs {
            records.extend(find_named_inputs(html).into_iter().map(|input| {
                Record::new(&self.config.id, RecordKind::TaxSystemDescriptor)
                    .with(FIELD_SOURCE, self.config.label.as_str())
                    .with(FIELD_KIND, "campo_formulario")
                    .with(FIELD_URL, page_url)
                    .with("campo", input.name)
                    .with("tipo_input", input.input_type)
                    .with("placeholder", input.placeholder)
            }));
        }

        records
    }
}

fn link_kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::DatasetReference => "conjunto_dados",
        _ => "servico_consulta",
    }
}

#[async_trait]
impl SourceAdapter for PortalAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn label(&self) -> &str {
        &self.config.label
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Portal
    }

    async fn collect(&self, ctx: &CollectContext) -> SourceResult {
        let mut builder = SourceResultBuilder::new(&self.config.id);
        tracing::info!("[{}] Scanning {}", self.config.id, self.config.url);

        match ctx.get(&self.config.url, self.timeout).await {
            Ok(response) => {
                builder.succeeded();
                let records = self.extract(&response.body, &response.final_url);
                tracing::info!(
                    "[{}] {} matching entries found",
                    self.config.id,
                    records.len()
                );
                builder.extend(records);
            }
            Err(e) => builder.failed(e),
        }

        builder.finish()
    }
}
