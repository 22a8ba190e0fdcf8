//! Per-source outcome definitions
//!
//! Every adapter invocation produces exactly one `SourceResult`, whatever
//! happened on the network.

use crate::model::record::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Overall outcome of querying one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Every request made for this source succeeded
    Ok,

    /// Some requests succeeded, some failed
    Partial,

    /// Nothing could be obtained from this source
    Failed,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    /// Console marker used in summaries
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Partial => "~",
            Self::Failed => "✗",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures an adapter can run into while talking to its source
///
/// These never leave the adapter: they are folded into the result status and
/// `error_summary`. A well-formed response with nothing to extract is not an
/// error at all, just an empty result.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("transport failure for {url}: {message}")]
    TransportFailure { url: String, message: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("could not parse response from {url}: {message}")]
    ParseFailure { url: String, message: String },
}

/// Records obtained from one source plus how the attempt went
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    source_id: String,
    status: SourceStatus,
    records: Vec<Record>,
    error_summary: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl SourceResult {
    /// Creates a result stamped with the current time
    pub fn new(
        source_id: impl Into<String>,
        status: SourceStatus,
        records: Vec<Record>,
        error_summary: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            source_id: source_id.into(),
            status,
            records,
            error_summary,
            started_at: now,
            finished_at: now,
        }
    }

    /// A failed result with no records
    pub fn failed(source_id: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(source_id, SourceStatus::Failed, Vec::new(), Some(error.to_string()))
    }

    /// Overrides the timing stamps
    pub fn with_timing(mut self, started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self.finished_at = finished_at;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn status(&self) -> SourceStatus {
        self.status
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn error_summary(&self) -> Option<&str> {
        self.error_summary.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Number of records obtained
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A source is active when it produced at least one record
    pub fn is_active(&self) -> bool {
        !self.records.is_empty()
    }

    /// Elapsed wall-clock time in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Accumulates records and request outcomes while an adapter runs
///
/// The status is derived from the counted requests: all succeeded -> `Ok`,
/// some -> `Partial`, none -> `Failed`. An adapter that made no counted
/// request (a purely curated list) is `Ok`.
#[derive(Debug)]
pub struct SourceResultBuilder {
    source_id: String,
    started_at: DateTime<Utc>,
    records: Vec<Record>,
    errors: Vec<String>,
    attempts: usize,
    successes: usize,
}

impl SourceResultBuilder {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            started_at: Utc::now(),
            records: Vec::new(),
            errors: Vec::new(),
            attempts: 0,
            successes: 0,
        }
    }

    /// Adds one record
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Adds several records, preserving order
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    /// Counts a request that succeeded
    pub fn succeeded(&mut self) {
        self.attempts += 1;
        self.successes += 1;
    }

    /// Counts a request that failed and logs it
    pub fn failed(&mut self, error: SourceError) {
        tracing::warn!("[{}] {}", self.source_id, error);
        self.attempts += 1;
        self.errors.push(error.to_string());
    }

    /// Notes a failure of a best-effort request without affecting the status
    pub fn note(&mut self, error: SourceError) {
        tracing::warn!("[{}] best-effort request failed: {}", self.source_id, error);
        self.errors.push(error.to_string());
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seals the result
    pub fn finish(self) -> SourceResult {
        let status = if self.successes == self.attempts {
            SourceStatus::Ok
        } else if self.successes > 0 {
            SourceStatus::Partial
        } else {
            SourceStatus::Failed
        };

        let error_summary = if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.join("; "))
        };

        SourceResult {
            source_id: self.source_id,
            status,
            records: self.records,
            error_summary,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
