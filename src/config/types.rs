use crate::model::RecordKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Desktop browser identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Condo-Harvest
///
/// Every section is optional in the TOML file; missing sections fall back to
/// the built-in Maceió source set.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_portals", rename = "portal")]
    pub portals: Vec<PortalConfig>,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            portals: default_portals(),
            statistics: StatisticsConfig::default(),
            registry: RegistryConfig::default(),
            marketplace: MarketplaceConfig::default(),
        }
    }
}

impl Config {
    /// Ids of the enabled sources whose records are also exported as CSV
    pub fn tabular_sources(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if self.statistics.enabled && self.statistics.tabular {
            ids.push(self.statistics.id.clone());
        }
        if self.registry.enabled && self.registry.tabular {
            ids.push(self.registry.id.clone());
        }
        ids
    }
}

/// Collection run behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CollectorConfig {
    /// City whose properties are being surveyed
    pub city: String,

    /// Two-letter state abbreviation
    pub state: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Per-request timeout used when a source does not set its own (seconds)
    pub default_timeout_secs: u64,

    /// Minimum time between requests to the same host (milliseconds)
    pub default_interval_ms: u64,

    /// Number of sources that may be collected at the same time
    pub max_parallel_sources: usize,
}

impl CollectorConfig {
    /// Resolves a source-specific timeout override against the default
    pub fn timeout(&self, override_secs: Option<u64>) -> Duration {
        Duration::from_secs(override_secs.unwrap_or(self.default_timeout_secs))
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            city: "Maceió".to_string(),
            state: "AL".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_timeout_secs: 15,
            default_interval_ms: 0,
            max_parallel_sources: 1,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory receiving the JSON, CSV and Markdown artifacts
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "dados_condominios_maceio_real".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    /// Optional log file written alongside console output
    pub file: Option<String>,
}

/// An HTML portal scanned for property-related links and form fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortalConfig {
    /// Stable source identifier
    pub id: String,

    /// Human readable source name, stored in every record's `fonte` field
    pub label: String,

    /// Page to fetch
    pub url: String,

    /// Link labels containing any of these (case-insensitive) are collected
    pub keywords: Vec<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Also describe every named `<input>` on the page
    #[serde(default)]
    pub scan_form_inputs: bool,

    /// Kind assigned to records built from matching links
    #[serde(default = "default_link_kind")]
    pub link_kind: RecordKind,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// The IBGE statistics API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StatisticsConfig {
    pub id: String,
    pub label: String,

    /// API root, e.g. `https://servicodados.ibge.gov.br/api`
    pub base_url: String,

    /// IBGE municipality code
    pub municipality_code: u32,

    /// Aggregate table holding the indicator
    pub aggregate: u32,

    /// Reference period (year) of the indicator
    pub period: String,

    /// Indicator variable within the aggregate
    pub variable: u32,

    pub timeout_secs: Option<u64>,
    pub enabled: bool,

    /// Export this source's records as CSV
    pub tabular: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            id: "ibge".to_string(),
            label: "IBGE".to_string(),
            base_url: "https://servicodados.ibge.gov.br/api".to_string(),
            municipality_code: 2704302,
            aggregate: 6579,
            period: "2021".to_string(),
            variable: 9324,
            timeout_secs: Some(15),
            enabled: true,
            tabular: true,
        }
    }
}

/// Registry offices known ahead of time
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RegistryConfig {
    pub id: String,
    pub label: String,

    /// National registry index probed on a best-effort basis
    pub index_url: Option<String>,

    pub timeout_secs: Option<u64>,
    pub enabled: bool,
    pub tabular: bool,

    #[serde(rename = "office")]
    pub offices: Vec<RegistryOffice>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id: "cartorios".to_string(),
            label: "Cartórios de Registro de Imóveis".to_string(),
            index_url: Some("https://www.registrodeimoveis.org.br/".to_string()),
            timeout_secs: Some(10),
            enabled: true,
            tabular: true,
            offices: default_registry_offices(),
        }
    }
}

/// One registry office entry
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryOffice {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

/// Real-estate marketplace listing pages
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MarketplaceConfig {
    pub id: String,
    pub label: String,

    /// Minimum time between two requests to the same marketplace host (milliseconds)
    pub interval_ms: u64,

    /// Number of leading containers inspected per page
    pub max_containers: usize,

    /// CSS selector for the containers
    pub container_selector: String,

    /// Domain keywords; the lowercased city name is always added
    pub keywords: Vec<String>,

    pub timeout_secs: Option<u64>,
    pub enabled: bool,

    #[serde(rename = "site")]
    pub sites: Vec<MarketplaceSite>,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            id: "marketplaces".to_string(),
            label: "Portais Imobiliários".to_string(),
            interval_ms: 3000,
            max_containers: 10,
            container_selector: "div".to_string(),
            keywords: vec![
                "apartamento".to_string(),
                "condomínio".to_string(),
                "edifício".to_string(),
            ],
            timeout_secs: Some(15),
            enabled: true,
            sites: default_marketplace_sites(),
        }
    }
}

/// One marketplace listing page
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceSite {
    pub name: String,
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_link_kind() -> RecordKind {
    RecordKind::InquiryService
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Built-in portal set for Maceió
pub fn default_portals() -> Vec<PortalConfig> {
    vec![
        PortalConfig {
            id: "portal_cidadao".to_string(),
            label: "Portal do Cidadão Maceió".to_string(),
            url: "https://www.online.maceio.al.gov.br/".to_string(),
            keywords: strings(&["imóvel", "imovel", "cadastr", "iptu", "predial"]),
            timeout_secs: Some(10),
            scan_form_inputs: false,
            link_kind: RecordKind::InquiryService,
            enabled: true,
        },
        PortalConfig {
            id: "sefaz_iptu".to_string(),
            label: "SEFAZ Maceió - IPTU".to_string(),
            url: "https://online.maceio.al.gov.br/".to_string(),
            keywords: strings(&["iptu", "imóvel", "imovel", "consulta", "certid"]),
            timeout_secs: Some(15),
            scan_form_inputs: true,
            link_kind: RecordKind::InquiryService,
            enabled: true,
        },
        PortalConfig {
            id: "transparencia_al".to_string(),
            label: "Portal da Transparência AL".to_string(),
            url: "https://transparencia.al.gov.br/".to_string(),
            keywords: strings(&["imóv", "imov", "patrimônio", "patrimonio", "habitação"]),
            timeout_secs: Some(15),
            scan_form_inputs: false,
            link_kind: RecordKind::InquiryService,
            enabled: true,
        },
        PortalConfig {
            id: "dados_abertos".to_string(),
            label: "Dados Abertos Brasil".to_string(),
            url: "https://dados.gov.br/dados/conjuntos-dados".to_string(),
            keywords: strings(&["imóv", "imov", "iptu", "habitação", "maceió"]),
            timeout_secs: Some(15),
            scan_form_inputs: false,
            link_kind: RecordKind::DatasetReference,
            enabled: true,
        },
    ]
}

fn default_registry_offices() -> Vec<RegistryOffice> {
    let services = strings(&[
        "Matrícula de imóveis",
        "Certidão de ônus reais",
        "Registro de incorporação e condomínio",
    ]);

    vec![
        RegistryOffice {
            name: "1º Registro Geral de Imóveis de Maceió".to_string(),
            address: "Centro, Maceió - AL".to_string(),
            phone: None,
            services: services.clone(),
        },
        RegistryOffice {
            name: "2º Registro Geral de Imóveis de Maceió".to_string(),
            address: "Farol, Maceió - AL".to_string(),
            phone: None,
            services: services.clone(),
        },
        RegistryOffice {
            name: "3º Registro Geral de Imóveis de Maceió".to_string(),
            address: "Jatiúca, Maceió - AL".to_string(),
            phone: None,
            services,
        },
    ]
}

fn default_marketplace_sites() -> Vec<MarketplaceSite> {
    vec![
        MarketplaceSite {
            name: "ZAP Imóveis".to_string(),
            url: "https://www.zapimoveis.com.br/venda/apartamentos/al+maceio/".to_string(),
        },
        MarketplaceSite {
            name: "Viva Real".to_string(),
            url: "https://www.vivareal.com.br/venda/alagoas/maceio/apartamento_residencial/"
                .to_string(),
        },
        MarketplaceSite {
            name: "OLX Imóveis".to_string(),
            url: "https://www.olx.com.br/imoveis/venda/apartamentos/estado-al/alagoas/maceio"
                .to_string(),
        },
    ]
}
