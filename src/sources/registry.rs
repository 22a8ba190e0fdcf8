//! Registry office adapter
//!
//! Registry offices are not published in any machine-readable form, so the
//! list is curated in configuration and emitted regardless of network state.
//! The national registry index is probed on a best-effort basis; reaching it
//! adds one descriptor record, failing to reach it only adds a note.

use crate::config::{RegistryConfig, RegistryOffice};
use crate::model::{
    Record, RecordKind, SourceResult, SourceResultBuilder, FIELD_KIND, FIELD_NAME, FIELD_SOURCE,
    FIELD_URL,
};
use crate::sources::parser::page_title;
use crate::sources::{AdapterKind, CollectContext, SourceAdapter};
use async_trait::async_trait;
use std::time::Duration;

/// Adapter for the curated registry office list
#[derive(Debug, Clone)]
pub struct RegistryAdapter {
    config: RegistryConfig,
    timeout: Duration,
}

impl RegistryAdapter {
    pub fn new(config: RegistryConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// One record per curated office
    pub fn office_records(&self) -> Vec<Record> {
        self.config
            .offices
            .iter()
            .map(|office| self.office_record(office))
            .collect()
    }

    fn office_record(&self, office: &RegistryOffice) -> Record {
        Record::new(&self.config.id, RecordKind::RegistryOffice)
            .with(FIELD_SOURCE, self.config.label.as_str())
            .with(FIELD_KIND, "cartorio")
            .with(FIELD_NAME, office.name.as_str())
            .with("endereco", office.address.as_str())
            .with("telefone", office.phone.clone())
            .with("servicos", office.services.clone())
    }

    /// Descriptor for a reachable registry index page
    pub fn index_record(&self, url: &str, status_code: u16, html: &str) -> Record {
        Record::new(&self.config.id, RecordKind::RegistryOffice)
            .with(FIELD_SOURCE, self.config.label.as_str())
            .with(FIELD_KIND, "indice_nacional")
            .with(FIELD_NAME, page_title(html))
            .with(FIELD_URL, url)
            .with("status_http", status_code)
    }
}

#[async_trait]
impl SourceAdapter for RegistryAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn label(&self) -> &str {
        &self.config.label
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Registry
    }

    async fn collect(&self, ctx: &CollectContext) -> SourceResult {
        let mut builder = SourceResultBuilder::new(&self.config.id);
        builder.extend(self.office_records());
        tracing::info!(
            "[{}] {} curated registry offices",
            self.config.id,
            builder.len()
        );

        if let Some(index_url) = &self.config.index_url {
            match ctx.get(index_url, self.timeout).await {
                Ok(response) => {
                    tracing::info!("[{}] Registry index reachable", self.config.id);
                    builder.push(self.index_record(
                        index_url,
                        response.status_code,
                        &response.body,
                    ));
                }
                Err(e) => builder.note(e),
            }
        }

        builder.finish()
    }
}
