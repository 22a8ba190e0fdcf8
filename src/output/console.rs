//! Console summary printed at the end of a run

use crate::collector::Aggregate;
use crate::output::ReportOutcome;

/// Formats the per-source lines and totals
pub fn format_summary(aggregate: &Aggregate) -> String {
    let meta = aggregate.metadata();
    let mut out = String::new();

    out.push_str("=== Collection Summary ===\n\n");
    if let Some(city) = &meta.city {
        out.push_str(&format!("City: {}\n\n", city));
    }

    out.push_str("Sources:\n");
    for source in aggregate.sources() {
        out.push_str(&format!(
            "  {} {}: {} records",
            source.status().marker(),
            source.source_id(),
            source.len()
        ));
        if let Some(error) = source.error_summary() {
            out.push_str(&format!(" ({})", error));
        }
        out.push('\n');
    }
    out.push('\n');

    out.push_str(&format!(
        "Active sources: {}/{}\n",
        meta.active_source_count, meta.source_count
    ));
    out.push_str(&format!("Failed sources: {}\n", meta.failed_source_count));
    out.push_str(&format!("Total records: {}\n", meta.total_record_count));

    out
}

/// Prints the summary and where the artifacts went
pub fn print_summary(aggregate: &Aggregate, outcome: &ReportOutcome) {
    print!("{}", format_summary(aggregate));

    if !outcome.written.is_empty() {
        println!("\nArtifacts:");
        for path in &outcome.written {
            println!("  ✓ {}", path.display());
        }
    }
    if !outcome.failed.is_empty() {
        println!("\nArtifacts not written:");
        for (path, error) in &outcome.failed {
            println!("  ✗ {} ({})", path.display(), error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::aggregate;
    use crate::model::{Record, RecordKind, SourceResult, SourceStatus};
    use chrono::Utc;

    #[test]
    fn test_format_summary_markers() {
        let agg = aggregate(
            vec![
                SourceResult::new(
                    "ibge",
                    SourceStatus::Ok,
                    vec![Record::new("ibge", RecordKind::MunicipalityStat)],
                    None,
                ),
                SourceResult::new(
                    "marketplaces",
                    SourceStatus::Partial,
                    vec![Record::new("marketplaces", RecordKind::MarketplaceSnapshot)],
                    Some("unexpected HTTP status 403 from https://x".to_string()),
                ),
                SourceResult::failed("sefaz_iptu", "timeout"),
            ],
            Utc::now(),
        )
        .with_city("Maceió");

        let summary = format_summary(&agg);

        assert!(summary.contains("City: Maceió"));
        assert!(summary.contains("  ✓ ibge: 1 records\n"));
        assert!(summary.contains("  ~ marketplaces: 1 records (unexpected HTTP status 403"));
        assert!(summary.contains("  ✗ sefaz_iptu: 0 records (timeout)"));
        assert!(summary.contains("Active sources: 2/3"));
        assert!(summary.contains("Total records: 2"));
    }
}
