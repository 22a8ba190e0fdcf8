//! Report generation
//!
//! This module handles:
//! - The full JSON export of the aggregate
//! - CSV extracts for tabular sources
//! - The Markdown report
//! - The console summary
//!
//! Every artifact is written independently: a failure is logged and recorded
//! in the returned [`ReportOutcome`] while the remaining artifacts are still
//! attempted.

mod console;
mod json;
mod markdown;
mod tabular;

pub use console::{format_summary, print_summary};
pub use json::write_json;
pub use markdown::{format_report, write_markdown};
pub use tabular::{collect_columns, write_csv};

use crate::collector::Aggregate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp format embedded in artifact file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Errors that can occur while writing artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Write(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// What happened to each artifact of a run
#[derive(Debug, Default)]
pub struct ReportOutcome {
    /// Artifacts written successfully
    pub written: Vec<PathBuf>,

    /// Artifacts that could not be written
    pub failed: Vec<(PathBuf, OutputError)>,
}

impl ReportOutcome {
    /// True when artifacts were attempted and none was written
    pub fn all_failed(&self) -> bool {
        self.written.is_empty() && !self.failed.is_empty()
    }

    fn record(&mut self, path: PathBuf, result: OutputResult<()>) {
        match result {
            Ok(()) => {
                tracing::info!("Wrote {}", path.display());
                self.written.push(path);
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", path.display(), e);
                self.failed.push((path, e));
            }
        }
    }
}

/// Writes every artifact of a run into `directory`
///
/// # Arguments
///
/// * `aggregate` - The run aggregate
/// * `directory` - Output directory, created if absent
/// * `tabular_sources` - Source ids that also get a CSV extract
///
/// # Returns
///
/// The per-artifact outcome. This function never fails as a whole.
pub fn write_reports(
    aggregate: &Aggregate,
    directory: &Path,
    tabular_sources: &[String],
) -> ReportOutcome {
    let timestamp = aggregate
        .metadata()
        .collected_at
        .format(TIMESTAMP_FORMAT)
        .to_string();

    let mut outcome = ReportOutcome::default();
    let dir_result = fs::create_dir_all(directory);

    let json_path = directory.join(format!("dados_completos_{}.json", timestamp));
    let result = ensure_dir(&dir_result).and_then(|_| write_json(aggregate, &json_path));
    outcome.record(json_path, result);

    for source_id in tabular_sources {
        let Some(source) = aggregate.get(source_id) else {
            tracing::debug!("No result for tabular source {}, skipping CSV", source_id);
            continue;
        };
        if source.is_empty() {
            tracing::debug!("Source {} has no records, skipping CSV", source_id);
            continue;
        }

        let csv_path = directory.join(format!("{}_{}.csv", source_id, timestamp));
        let result = ensure_dir(&dir_result).and_then(|_| write_csv(source.records(), &csv_path));
        outcome.record(csv_path, result);
    }

    let md_path = directory.join(format!("relatorio_{}.md", timestamp));
    let result = ensure_dir(&dir_result).and_then(|_| write_markdown(aggregate, &md_path));
    outcome.record(md_path, result);

    outcome
}

fn ensure_dir(dir_result: &std::io::Result<()>) -> OutputResult<()> {
    match dir_result {
        Ok(()) => Ok(()),
        Err(e) => Err(OutputError::Write(format!(
            "could not create output directory: {}",
            e
        ))),
    }
}
