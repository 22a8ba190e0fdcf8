//! Markdown report generation
//!
//! The report is written for the people who will follow up on the survey:
//! run information, an overview, a per-source table, record previews and a
//! list of recommended next steps.

use crate::collector::Aggregate;
use crate::model::SourceStatus;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Number of record previews shown per source
const PREVIEWS_PER_SOURCE: usize = 3;

/// Delimiter between preview fields
const PREVIEW_DELIMITER: &str = " | ";

/// Next steps listed in every report
const NEXT_STEPS: [&str; 4] = [
    "Validar os registros coletados junto às fontes oficiais",
    "Solicitar acesso formal às bases de IPTU e dos cartórios para obter dados completos",
    "Cruzar os indicadores do IBGE com os anúncios dos portais imobiliários",
    "Agendar coletas periódicas para acompanhar a evolução das fontes",
];

/// Writes the Markdown report
///
/// # Arguments
///
/// * `aggregate` - The run aggregate
/// * `output_path` - Path where the report should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown(aggregate: &Aggregate, output_path: &Path) -> OutputResult<()> {
    let markdown = format_report(aggregate);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats an aggregate as a Markdown report
pub fn format_report(aggregate: &Aggregate) -> String {
    let meta = aggregate.metadata();
    let mut md = String::new();

    md.push_str("# Relatório de Coleta de Dados de Condomínios\n\n");

    md.push_str("## Informações da Execução\n\n");
    md.push_str(&format!(
        "- **Data da coleta**: {}\n",
        meta.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(city) = &meta.city {
        md.push_str(&format!("- **Cidade**: {}\n", city));
    }
    if let Some(hash) = &meta.config_hash {
        md.push_str(&format!("- **Hash da configuração**: {}\n", hash));
    }
    md.push('\n');

    md.push_str("## Visão Geral\n\n");
    md.push_str(&format!(
        "- **Fontes ativas**: {}/{}\n",
        meta.active_source_count, meta.source_count
    ));
    md.push_str(&format!(
        "- **Fontes com falha**: {}\n",
        meta.failed_source_count
    ));
    md.push_str(&format!(
        "- **Total de registros**: {}\n\n",
        meta.total_record_count
    ));

    if !aggregate.sources().is_empty() {
        md.push_str("## Fontes\n\n");
        md.push_str("| Fonte | Status | Registros | Erro |\n");
        md.push_str("|-------|--------|-----------|------|\n");
        for source in aggregate.sources() {
            md.push_str(&format!(
                "| {} | {} {} | {} | {} |\n",
                source.source_id(),
                source.status().marker(),
                source.status(),
                source.len(),
                table_cell(source.error_summary().unwrap_or("-"))
            ));
        }
        md.push('\n');
    }

    let previewed: Vec<_> = aggregate
        .sources()
        .iter()
        .filter(|s| s.is_active())
        .collect();
    if !previewed.is_empty() {
        md.push_str("## Amostras\n\n");
        for source in previewed {
            md.push_str(&format!(
                "### {} ({} registros)\n\n",
                source.source_id(),
                source.len()
            ));
            for record in source.records().iter().take(PREVIEWS_PER_SOURCE) {
                md.push_str(&format!("- {}\n", record.preview(PREVIEW_DELIMITER)));
            }
            if source.len() > PREVIEWS_PER_SOURCE {
                md.push_str(&format!(
                    "- ... e mais {}\n",
                    source.len() - PREVIEWS_PER_SOURCE
                ));
            }
            md.push('\n');
        }
    }

    md.push_str("## Recomendações\n\n");
    for step in NEXT_STEPS {
        md.push_str(&format!("- {}\n", step));
    }
    for source in aggregate.failed_sources() {
        md.push_str(&format!(
            "- ⚠️ A fonte `{}` falhou: {}\n",
            source.source_id(),
            source.error_summary().unwrap_or("motivo desconhecido")
        ));
    }
    for source in aggregate
        .sources()
        .iter()
        .filter(|s| s.status() == SourceStatus::Partial)
    {
        md.push_str(&format!(
            "- A fonte `{}` respondeu parcialmente; repetir a coleta\n",
            source.source_id()
        ));
    }

    md
}

/// Keeps pipes and newlines from breaking the table layout
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::aggregate;
    use crate::model::{Record, RecordKind, SourceResult, SourceStatus};
    use chrono::Utc;

    fn portal_record(i: usize) -> Record {
        Record::new("portal_cidadao", RecordKind::InquiryService)
            .with("fonte", "Portal do Cidadão")
            .with("tipo", "servico_consulta")
            .with("servico", format!("Serviço {}", i))
            .with("href", "/x")
    }

    fn create_test_aggregate() -> Aggregate {
        let portal = SourceResult::new(
            "portal_cidadao",
            SourceStatus::Ok,
            (0..5).map(portal_record).collect(),
            None,
        );
        let sefaz = SourceResult::failed("sefaz_iptu", "unexpected HTTP status 503 from x");
        let empty = SourceResult::new("transparencia_al", SourceStatus::Ok, vec![], None);

        aggregate(vec![portal, sefaz, empty], Utc::now())
            .with_city("Maceió")
            .with_config_hash("abc123")
    }

    #[test]
    fn test_format_report_sections() {
        let markdown = format_report(&create_test_aggregate());

        assert!(markdown.contains("# Relatório de Coleta"));
        assert!(markdown.contains("- **Cidade**: Maceió"));
        assert!(markdown.contains("abc123"));
        assert!(markdown.contains("- **Fontes ativas**: 1/3"));
        assert!(markdown.contains("- **Total de registros**: 5"));
        assert!(markdown.contains("| sefaz_iptu | ✗ failed | 0 |"));
        assert!(markdown.contains("## Recomendações"));
    }

    #[test]
    fn test_previews_limited_and_ordered() {
        let markdown = format_report(&create_test_aggregate());

        assert!(markdown.contains("- Portal do Cidadão | servico_consulta | Serviço 0\n"));
        assert!(markdown.contains("Serviço 2"));
        assert!(!markdown.contains("Serviço 3"));
        assert!(markdown.contains("... e mais 2"));
        // sources without records get no preview section
        assert!(!markdown.contains("### transparencia_al"));
    }

    #[test]
    fn test_warning_per_failed_source() {
        let markdown = format_report(&create_test_aggregate());

        assert_eq!(markdown.matches("⚠️").count(), 1);
        assert!(markdown.contains("`sefaz_iptu` falhou: unexpected HTTP status 503"));
    }

    #[test]
    fn test_empty_aggregate() {
        let markdown = format_report(&aggregate(vec![], Utc::now()));

        assert!(markdown.contains("- **Fontes ativas**: 0/0"));
        assert!(!markdown.contains("## Fontes\n"));
        assert!(!markdown.contains("⚠️"));
    }

    #[test]
    fn test_table_cell_escapes_pipes() {
        assert_eq!(table_cell("a | b\nc"), "a \\| b c");
    }
}
