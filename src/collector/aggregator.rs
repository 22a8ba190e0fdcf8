//! Merging per-source results into one run aggregate
//!
//! Aggregation is pure: it never touches the network or the filesystem, and
//! re-aggregating the same results yields the same counts.

use crate::model::{SourceResult, SourceStatus};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Run-level counters and identification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// When the run finished collecting
    pub collected_at: DateTime<Utc>,

    /// City the run was about
    pub city: Option<String>,

    /// SHA-256 of the configuration file, when one was used
    pub config_hash: Option<String>,

    /// Number of distinct sources queried
    pub source_count: usize,

    /// Sources that produced at least one record
    pub active_source_count: usize,

    /// Sources whose status is `failed`
    pub failed_source_count: usize,

    /// Records across all sources
    pub total_record_count: usize,
}

/// All source results of one run, keyed by source id in run order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    metadata: Metadata,

    #[serde(serialize_with = "serialize_sources")]
    sources: Vec<SourceResult>,
}

impl Aggregate {
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Source results in the order they were first seen
    pub fn sources(&self) -> &[SourceResult] {
        &self.sources
    }

    /// Looks up one source by id
    pub fn get(&self, source_id: &str) -> Option<&SourceResult> {
        self.sources.iter().find(|r| r.source_id() == source_id)
    }

    /// Sources whose status is `failed`
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceResult> {
        self.sources
            .iter()
            .filter(|r| r.status() == SourceStatus::Failed)
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.metadata.city = Some(city.into());
        self
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.metadata.config_hash = Some(hash.into());
        self
    }
}

/// Merges source results into an aggregate
///
/// # Arguments
///
/// * `results` - One result per source, in run order
/// * `collected_at` - Timestamp recorded in the metadata
///
/// When two results share a source id, the later one replaces the earlier
/// one in its original position.
pub fn aggregate(results: Vec<SourceResult>, collected_at: DateTime<Utc>) -> Aggregate {
    let mut sources: Vec<SourceResult> = Vec::with_capacity(results.len());

    for result in results {
        match sources
            .iter_mut()
            .find(|existing| existing.source_id() == result.source_id())
        {
            Some(existing) => {
                tracing::debug!(
                    "Source {} reported twice, keeping the later result",
                    result.source_id()
                );
                *existing = result;
            }
            None => sources.push(result),
        }
    }

    let metadata = Metadata {
        collected_at,
        city: None,
        config_hash: None,
        source_count: sources.len(),
        active_source_count: sources.iter().filter(|r| r.is_active()).count(),
        failed_source_count: sources
            .iter()
            .filter(|r| r.status() == SourceStatus::Failed)
            .count(),
        total_record_count: sources.iter().map(|r| r.len()).sum(),
    };

    Aggregate { metadata, sources }
}

fn serialize_sources<S>(sources: &[SourceResult], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(sources.len()))?;
    for result in sources {
        map.serialize_entry(result.source_id(), result)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, RecordKind};

    fn result(id: &str, status: SourceStatus, records: usize) -> SourceResult {
        let records = (0..records)
            .map(|i| Record::new(id, RecordKind::InquiryService).with("servico", i as i64))
            .collect();
        SourceResult::new(id, status, records, None)
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate(vec![], Utc::now());
        let meta = agg.metadata();

        assert_eq!(meta.source_count, 0);
        assert_eq!(meta.active_source_count, 0);
        assert_eq!(meta.total_record_count, 0);
        assert!(agg.sources().is_empty());
    }

    #[test]
    fn test_counts() {
        let agg = aggregate(
            vec![
                result("a", SourceStatus::Ok, 3),
                result("b", SourceStatus::Failed, 0),
                result("c", SourceStatus::Ok, 0),
                result("d", SourceStatus::Partial, 2),
            ],
            Utc::now(),
        );
        let meta = agg.metadata();

        assert_eq!(meta.source_count, 4);
        assert_eq!(meta.active_source_count, 2);
        assert_eq!(meta.failed_source_count, 1);
        assert_eq!(meta.total_record_count, 5);
        assert_eq!(agg.failed_sources().count(), 1);
    }

    #[test]
    fn test_all_failed() {
        let agg = aggregate(
            vec![
                result("a", SourceStatus::Failed, 0),
                result("b", SourceStatus::Failed, 0),
            ],
            Utc::now(),
        );

        assert_eq!(agg.metadata().active_source_count, 0);
        assert_eq!(agg.metadata().failed_source_count, 2);
    }

    #[test]
    fn test_idempotent() {
        let results = vec![
            result("a", SourceStatus::Ok, 2),
            result("b", SourceStatus::Partial, 1),
        ];
        let at = Utc::now();

        let first = aggregate(results.clone(), at);
        let second = aggregate(first.sources().to_vec(), at);

        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_id_later_wins() {
        let agg = aggregate(
            vec![
                result("a", SourceStatus::Failed, 0),
                result("b", SourceStatus::Ok, 1),
                result("a", SourceStatus::Ok, 4),
            ],
            Utc::now(),
        );

        assert_eq!(agg.metadata().source_count, 2);
        assert_eq!(agg.sources()[0].source_id(), "a");
        assert_eq!(agg.get("a").unwrap().len(), 4);
        assert_eq!(agg.metadata().total_record_count, 5);
    }

    #[test]
    fn test_serializes_sources_as_map() {
        let agg = aggregate(vec![result("ibge", SourceStatus::Ok, 1)], Utc::now())
            .with_city("Maceió")
            .with_config_hash("abc123");
        let json = serde_json::to_value(&agg).unwrap();

        assert_eq!(json["metadata"]["city"], "Maceió");
        assert_eq!(json["metadata"]["config_hash"], "abc123");
        assert_eq!(json["metadata"]["total_record_count"], 1);
        assert_eq!(json["sources"]["ibge"]["status"], "ok");
        assert_eq!(json["sources"]["ibge"]["records"][0]["servico"], 0);
    }
}
