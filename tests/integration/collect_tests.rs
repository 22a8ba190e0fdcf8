//! Integration tests for a full collection run
//!
//! These tests use wiremock to stand in for every external source and drive
//! the orchestrator, the aggregator and the report writers end-to-end.

use condo_harvest::collector::{aggregate, Orchestrator};
use condo_harvest::config::{
    default_portals, load_config_with_hash, Config, MarketplaceSite, PortalConfig, RegistryOffice,
};
use condo_harvest::model::{FieldValue, RecordKind, SourceStatus};
use condo_harvest::output::write_reports;
use chrono::Utc;
use serde_json::json;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNREACHABLE: &str = "http://127.0.0.1:9";

const PORTAL_PAGE: &str = r#"<html><body>
    <a href="/iptu/segunda-via">Emitir 2ª via do IPTU</a>
    <a href="/imovel/cadastro">Cadastro Imobiliário</a>
    <a href="/dados/iptu.csv">Base do IPTU por imóvel</a>
    <a href="/noticias">Notícias</a>
    <form><input name="inscricao" placeholder="Inscrição do imóvel"></form>
</body></html>"#;

fn listing_page() -> String {
    let mut html = String::from("<html><body>");
    for i in 0..12 {
        if i % 3 == 0 {
            html.push_str(&format!("<div>Apartamento no Condomínio {}</div>", i));
        } else {
            html.push_str("<div>Terreno</div>");
        }
    }
    html.push_str("</body></html>");
    html
}

fn portal(id: &str, url: String) -> PortalConfig {
    PortalConfig {
        id: id.to_string(),
        label: format!("Portal {}", id),
        url,
        keywords: vec!["iptu".to_string(), "imóvel".to_string()],
        timeout_secs: Some(2),
        scan_form_inputs: false,
        link_kind: RecordKind::InquiryService,
        enabled: true,
    }
}

/// Configuration pointing every built-in source at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.collector.user_agent = "TestAgent/1.0".to_string();

    config.portals = default_portals()
        .into_iter()
        .map(|mut p| {
            p.url = format!("{}/{}", base_url, p.id);
            p.timeout_secs = Some(2);
            p
        })
        .collect();

    config.statistics.base_url = base_url.to_string();
    config.statistics.timeout_secs = Some(2);

    config.registry.index_url = Some(format!("{}/registro", base_url));
    config.registry.timeout_secs = Some(2);
    config.registry.offices = vec![RegistryOffice {
        name: "1º Registro de Imóveis".to_string(),
        address: "Centro, Maceió".to_string(),
        phone: Some("(82) 0000-0000".to_string()),
        services: vec!["Matrícula".to_string()],
    }];

    config.marketplace.interval_ms = 20;
    config.marketplace.timeout_secs = Some(2);
    config.marketplace.sites = vec![
        MarketplaceSite {
            name: "Portal A".to_string(),
            url: format!("{}/anuncios/a", base_url),
        },
        MarketplaceSite {
            name: "Portal B".to_string(),
            url: format!("{}/anuncios/b", base_url),
        },
    ];

    config
}

async fn mount_sources(server: &MockServer) {
    for portal in ["portal_cidadao", "sefaz_iptu", "transparencia_al", "dados_abertos"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", portal)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PORTAL_PAGE)
                    .insert_header("content-type", "text/html"),
            )
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/v1/localidades/municipios/2704302"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2704302,
            "nome": "Maceió",
            "microrregiao": {
                "nome": "Maceió",
                "mesorregiao": {
                    "nome": "Leste Alagoano",
                    "UF": {"sigla": "AL", "regiao": {"nome": "Nordeste"}}
                }
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/agregados/6579/periodos/2021/variaveis/9324"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "variavel": "População residente estimada",
            "unidade": "Pessoas",
            "resultados": [{"series": [{"serie": {"2021": "1031597"}}]}]
        }])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/registro"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Registro de Imóveis</title></head></html>"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/anuncios/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/anuncios/b"))
        .respond_with(ResponseTemplate::new(403))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_all_sources() {
    let mock_server = MockServer::start().await;
    mount_sources(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let orchestrator = Orchestrator::new(&config).expect("client builds");
    let results = orchestrator.run().await;

    let ids: Vec<&str> = results.iter().map(|r| r.source_id()).collect();
    assert_eq!(
        ids,
        vec![
            "portal_cidadao",
            "sefaz_iptu",
            "transparencia_al",
            "dados_abertos",
            "ibge",
            "cartorios",
            "marketplaces"
        ]
    );

    let agg = aggregate(results, Utc::now()).with_city("Maceió");
    let meta = agg.metadata();
    assert_eq!(meta.source_count, 7);
    assert_eq!(meta.active_source_count, 7);
    assert_eq!(meta.failed_source_count, 0);
    assert_eq!(
        meta.total_record_count,
        agg.sources().iter().map(|s| s.len()).sum::<usize>()
    );

    // portal link matching plus form scanning on the IPTU system
    assert_eq!(agg.get("portal_cidadao").unwrap().len(), 3);
    let sefaz = agg.get("sefaz_iptu").unwrap();
    assert!(sefaz
        .records()
        .iter()
        .any(|r| r.kind() == RecordKind::TaxSystemDescriptor));
    assert!(agg
        .get("dados_abertos")
        .unwrap()
        .records()
        .iter()
        .all(|r| r.kind() == RecordKind::DatasetReference));

    let ibge = agg.get("ibge").unwrap();
    assert_eq!(ibge.status(), SourceStatus::Ok);
    assert_eq!(ibge.records()[1].get("valor"), Some(&FieldValue::Integer(1031597)));

    let cartorios = agg.get("cartorios").unwrap();
    assert_eq!(cartorios.len(), 2);

    // one marketplace answered, the other refused
    let marketplaces = agg.get("marketplaces").unwrap();
    assert_eq!(marketplaces.status(), SourceStatus::Partial);
    assert_eq!(marketplaces.len(), 1);
    assert_eq!(
        marketplaces.records()[0].get("imoveis_detectados"),
        Some(&FieldValue::Integer(4))
    );

    let temp = TempDir::new().unwrap();
    let outcome = write_reports(&agg, temp.path(), &config.tabular_sources());
    assert!(outcome.failed.is_empty());
    // JSON, two CSV extracts, Markdown
    assert_eq!(outcome.written.len(), 4);

    let report_path = outcome
        .written
        .iter()
        .find(|p| p.extension().map_or(false, |e| e == "md"))
        .unwrap();
    let report = std::fs::read_to_string(report_path).unwrap();
    assert!(report.contains("- **Fontes ativas**: 7/7"));
    assert!(report.contains("A fonte `marketplaces` respondeu parcialmente"));
}

#[tokio::test]
async fn test_three_of_six_sources_unreachable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PORTAL_PAGE))
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.statistics.enabled = false;
    config.registry.enabled = false;
    config.marketplace.enabled = false;
    config.portals = vec![
        portal("p1", format!("{}/p1", mock_server.uri())),
        portal("p2", format!("{}/p2", UNREACHABLE)),
        portal("p3", format!("{}/p3", mock_server.uri())),
        portal("p4", format!("{}/p4", UNREACHABLE)),
        portal("p5", format!("{}/p5", mock_server.uri())),
        portal("p6", format!("{}/p6", UNREACHABLE)),
    ];

    let results = Orchestrator::new(&config).unwrap().run().await;
    assert_eq!(results.len(), 6);

    let agg = aggregate(results, Utc::now());
    let meta = agg.metadata();

    assert_eq!(meta.active_source_count, 3);
    assert_eq!(meta.failed_source_count, 3);
    for id in ["p2", "p4", "p6"] {
        let source = agg.get(id).unwrap();
        assert_eq!(source.status(), SourceStatus::Failed);
        assert!(source.is_empty());
        assert!(source.error_summary().is_some());
    }
}

#[tokio::test]
async fn test_parallel_run_matches_sequential() {
    let mock_server = MockServer::start().await;
    mount_sources(&mock_server).await;

    let mut config = create_test_config(&mock_server.uri());
    let sequential = Orchestrator::new(&config).unwrap().run().await;

    config.collector.max_parallel_sources = 4;
    let parallel = Orchestrator::new(&config).unwrap().run().await;

    let summary = |results: &[condo_harvest::SourceResult]| -> Vec<(String, SourceStatus, usize)> {
        results
            .iter()
            .map(|r| (r.source_id().to_string(), r.status(), r.len()))
            .collect()
    };
    assert_eq!(summary(&sequential), summary(&parallel));
}

#[tokio::test]
async fn test_everything_down_still_reports() {
    let mut config = Config::default();
    config.statistics.base_url = UNREACHABLE.to_string();
    config.statistics.timeout_secs = Some(2);
    config.registry.enabled = false;
    config.marketplace.enabled = false;
    config.portals = vec![portal("p1", UNREACHABLE.to_string())];

    let results = Orchestrator::new(&config).unwrap().run().await;
    let agg = aggregate(results, Utc::now());

    assert_eq!(agg.metadata().active_source_count, 0);
    assert_eq!(agg.metadata().failed_source_count, 2);

    let temp = TempDir::new().unwrap();
    let outcome = write_reports(&agg, temp.path(), &config.tabular_sources());

    // JSON and Markdown still written; empty tabular sources get no CSV
    assert_eq!(outcome.written.len(), 2);
    let report_path = outcome
        .written
        .iter()
        .find(|p| p.extension().map_or(false, |e| e == "md"))
        .unwrap();
    let report = std::fs::read_to_string(report_path).unwrap();
    assert_eq!(report.matches("⚠️").count(), 2);
}

#[tokio::test]
async fn test_run_from_config_file() {
    let mock_server = MockServer::start().await;
    mount_sources(&mock_server).await;
    let base = mock_server.uri();

    let toml = format!(
        r#"
[collector]
city = "Maceió"
user-agent = "TestAgent/1.0"
default-timeout-secs = 2

[[portal]]
id = "dados_abertos"
label = "Dados Abertos"
url = "{base}/dados_abertos"
keywords = ["iptu"]
link-kind = "dataset_reference"

[statistics]
enabled = false

[registry]
enabled = false

[marketplace]
interval-ms = 10
max-containers = 6

[[marketplace.site]]
name = "Portal A"
url = "{base}/anuncios/a"
"#
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();

    let (config, hash) = load_config_with_hash(file.path()).unwrap();
    assert_eq!(hash.len(), 64);

    let results = Orchestrator::new(&config).unwrap().run().await;
    let agg = aggregate(results, Utc::now()).with_config_hash(hash);

    assert_eq!(agg.metadata().source_count, 2);
    let dados = agg.get("dados_abertos").unwrap();
    assert_eq!(dados.len(), 2);
    assert!(dados
        .records()
        .iter()
        .all(|r| r.kind() == RecordKind::DatasetReference));

    // containers 0 and 3 of the first six mention apartments
    let marketplaces = agg.get("marketplaces").unwrap();
    assert_eq!(
        marketplaces.records()[0].get("imoveis_detectados"),
        Some(&FieldValue::Integer(2))
    );
}
