//! Record model shared by every source
//!
//! # Components
//!
//! - `Record`: one normalized, origin-tagged unit of extracted information
//! - `FieldValue`: the semi-structured values a record carries
//! - `SourceResult`: the records of one source plus how the attempt went

mod record;
mod result;

// Re-export main types
pub use record::{
    FieldValue, Record, RecordKind, FIELD_KIND, FIELD_NAME, FIELD_SERVICE, FIELD_SOURCE,
    FIELD_URL, PREVIEW_FIELDS,
};
pub use result::{SourceError, SourceResult, SourceResultBuilder, SourceStatus};
