//! CSV extracts for tabular sources
//!
//! One row per record. Columns are `source_id`, `record_kind`, then the union
//! of field names in the order they are first seen across the records.

use crate::model::Record;
use crate::output::OutputResult;
use csv::Writer;
use std::path::Path;

/// Union of field names across records, in first-seen order
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.fields().keys() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

/// Writes records as CSV; missing and null fields become empty cells
pub fn write_csv(records: &[Record], output_path: &Path) -> OutputResult<()> {
    let columns = collect_columns(records);
    let mut writer = Writer::from_path(output_path)?;

    let mut header = vec!["source_id".to_string(), "record_kind".to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.source_id().to_string(), record.kind().to_string()];
        row.extend(columns.iter().map(|name| {
            record
                .get(name)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldValue, RecordKind};
    use tempfile::TempDir;

    fn records() -> Vec<Record> {
        vec![
            Record::new("cartorios", RecordKind::RegistryOffice)
                .with("nome", "1º Registro")
                .with("telefone", FieldValue::Null)
                .with(
                    "servicos",
                    vec!["Registro de imóveis".to_string(), "Certidões".to_string()],
                ),
            Record::new("cartorios", RecordKind::RegistryOffice)
                .with("nome", "Índice nacional")
                .with("url", "https://www.registrodeimoveis.org.br/")
                .with("status_http", 200u16),
        ]
    }

    #[test]
    fn test_collect_columns_union() {
        let columns = collect_columns(&records());
        assert_eq!(
            columns,
            vec!["nome", "servicos", "telefone", "status_http", "url"]
        );
    }

    #[test]
    fn test_collect_columns_empty() {
        assert!(collect_columns(&[]).is_empty());
    }

    #[test]
    fn test_write_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cartorios.csv");
        write_csv(&records(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(String::from)
            .collect();
        assert_eq!(
            header,
            vec![
                "source_id",
                "record_kind",
                "nome",
                "servicos",
                "telefone",
                "status_http",
                "url"
            ]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "registry_office");
        assert_eq!(&rows[0][3], r#"["Registro de imóveis","Certidões"]"#);
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[0][5], "");
        assert_eq!(&rows[1][5], "200");
    }
}
