//! IBGE statistics API adapter
//!
//! Two requests are made: the municipality descriptor and one aggregate
//! indicator (by default the 2021 population estimate). Each yields one
//! `municipality_stat` record. Missing JSON paths never fail the extraction;
//! they become null fields, or the "N/A" sentinel for the indicator value.

use crate::config::StatisticsConfig;
use crate::model::{
    FieldValue, Record, RecordKind, SourceError, SourceResult, SourceResultBuilder, FIELD_KIND,
    FIELD_NAME, FIELD_SOURCE, FIELD_URL,
};
use crate::sources::parser::{lookup, lookup_field, parse_json};
use crate::sources::{AdapterKind, CollectContext, SourceAdapter};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Value stored when the indicator is missing from the response
pub const NOT_AVAILABLE: &str = "N/A";

/// Adapter for the IBGE data service
#[derive(Debug, Clone)]
pub struct StatisticsAdapter {
    config: StatisticsConfig,
    timeout: Duration,
}

impl StatisticsAdapter {
    pub fn new(config: StatisticsConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Municipality-by-code endpoint
    pub fn municipality_url(&self) -> String {
        format!(
            "{}/v1/localidades/municipios/{}",
            self.base_url(),
            self.config.municipality_code
        )
    }

    /// Aggregate indicator endpoint for the configured period
    pub fn indicator_url(&self) -> String {
        format!(
            "{}/v3/agregados/{}/periodos/{}/variaveis/{}?localidades=N6[{}]",
            self.base_url(),
            self.config.aggregate,
            self.config.period,
            self.config.variable,
            self.config.municipality_code
        )
    }

    /// Builds the municipality record from the descriptor document
    pub fn extract_municipality(&self, doc: &Value) -> Record {
        Record::new(&self.config.id, RecordKind::MunicipalityStat)
            .with(FIELD_SOURCE, self.config.label.as_str())
            .with(FIELD_KIND, "municipio")
            .with(FIELD_URL, self.municipality_url())
            .with("codigo_ibge", lookup_field(doc, "id"))
            .with(FIELD_NAME, lookup_field(doc, "nome"))
            .with("microrregiao", lookup_field(doc, "microrregiao.nome"))
            .with("mesorregiao", lookup_field(doc, "microrregiao.mesorregiao.nome"))
            .with("uf", lookup_field(doc, "microrregiao.mesorregiao.UF.sigla"))
            .with(
                "regiao",
                lookup_field(doc, "microrregiao.mesorregiao.UF.regiao.nome"),
            )
    }

    /// Builds the indicator record from the aggregate document
    pub fn extract_indicator(&self, doc: &Value) -> Record {
        let value_path = format!("0.resultados.0.series.0.serie.{}", self.config.period);
        let value = match lookup(doc, &value_path) {
            Some(Value::String(s)) => FieldValue::from_numeric_text(s),
            Some(Value::Number(n)) => FieldValue::from(Value::Number(n.clone())),
            _ => {
                tracing::debug!(
                    "[{}] Indicator value missing at {}",
                    self.config.id,
                    value_path
                );
                FieldValue::from(NOT_AVAILABLE)
            }
        };

        Record::new(&self.config.id, RecordKind::MunicipalityStat)
            .with(FIELD_SOURCE, self.config.label.as_str())
            .with(FIELD_KIND, "indicador")
            .with(FIELD_URL, self.indicator_url())
            .with("codigo_ibge", self.config.municipality_code)
            .with(FIELD_NAME, lookup_field(doc, "0.variavel"))
            .with("indicador", self.config.variable)
            .with("periodo", self.config.period.as_str())
            .with("valor", value)
            .with("unidade", lookup_field(doc, "0.unidade"))
    }

    async fn fetch_json(&self, ctx: &CollectContext, url: &str) -> Result<Value, SourceError> {
        let response = ctx.get(url, self.timeout).await?;
        parse_json(&response.body, url)
    }
}

#[async_trait]
impl SourceAdapter for StatisticsAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn label(&self) -> &str {
        &self.config.label
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Statistics
    }

    async fn collect(&self, ctx: &CollectContext) -> SourceResult {
        let mut builder = SourceResultBuilder::new(&self.config.id);

        let municipality_url = self.municipality_url();
        tracing::info!("[{}] Fetching municipality {}", self.config.id, municipality_url);
        match self.fetch_json(ctx, &municipality_url).await {
            Ok(doc) => {
                builder.succeeded();
                builder.push(self.extract_municipality(&doc));
            }
            Err(e) => builder.failed(e),
        }

        let indicator_url = self.indicator_url();
        tracing::info!("[{}] Fetching indicator {}", self.config.id, indicator_url);
        match self.fetch_json(ctx, &indicator_url).await {
            Ok(doc) => {
                builder.succeeded();
                builder.push(self.extract_indicator(&doc));
            }
            Err(e) => builder.failed(e),
        }

        builder.finish()
    }
}
