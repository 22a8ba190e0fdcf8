//! Normalized record definitions shared by every source
//!
//! Records are semi-structured: each carries its origin (`source_id`,
//! `record_kind`) plus an arbitrary mapping of field names to values.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Human readable source name
pub const FIELD_SOURCE: &str = "fonte";
/// Address of the resource the record describes
pub const FIELD_URL: &str = "url";
/// Free-form kind label set by the adapter
pub const FIELD_KIND: &str = "tipo";
/// Name of the described entity
pub const FIELD_NAME: &str = "nome";
/// Service label (portal links)
pub const FIELD_SERVICE: &str = "servico";

/// Fields shown in record previews, in priority order
pub const PREVIEW_FIELDS: [&str; 5] = [FIELD_SOURCE, FIELD_URL, FIELD_KIND, FIELD_NAME, FIELD_SERVICE];

/// What a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A link to an online inquiry service on a government portal
    InquiryService,

    /// One input field of a tax system form
    TaxSystemDescriptor,

    /// A statistic about the municipality
    MunicipalityStat,

    /// A reference to a published dataset
    DatasetReference,

    /// A registry office (or the registry index itself)
    RegistryOffice,

    /// A point-in-time observation of a marketplace listing page
    MarketplaceSnapshot,
}

impl RecordKind {
    /// Returns the wire name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InquiryService => "inquiry_service",
            Self::TaxSystemDescriptor => "tax_system_descriptor",
            Self::MunicipalityStat => "municipality_stat",
            Self::DatasetReference => "dataset_reference",
            Self::RegistryOffice => "registry_office",
            Self::MarketplaceSnapshot => "marketplace_snapshot",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value inside a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Parses text that looks like a number into a numeric value
    ///
    /// Statistics APIs commonly deliver numbers as strings; anything that does
    /// not parse stays text.
    pub fn from_numeric_text(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            Self::Integer(n)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                Self::Float(f)
            } else {
                Self::Text(text.to_string())
            }
        } else {
            Self::Text(text.to_string())
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            // JSON has no representation for NaN or infinity
            Self::Float(f) if !f.is_finite() => serializer.serialize_str(&f.to_string()),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

/// Renders the value for flat outputs: text as-is, null as empty, nested
/// values as compact JSON
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for FieldValue {
    fn from(value: &serde_json::Value) -> Self {
        Self::from(value.clone())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<usize> for FieldValue {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Self::Integer)
            .unwrap_or(Self::Float(value as f64))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Self::Text).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One normalized unit of extracted information
///
/// Records are built with [`Record::new`] and [`Record::with`] and are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    source_id: String,
    record_kind: RecordKind,
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Starts a record with no fields
    pub fn new(source_id: impl Into<String>, record_kind: RecordKind) -> Self {
        Self {
            source_id: source_id.into(),
            record_kind,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, replacing any earlier value under the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// The source that produced this record
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// What this record describes
    pub fn kind(&self) -> RecordKind {
        self.record_kind
    }

    /// Looks up a field; `None` means the field was never set
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All fields, ordered by name
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Condensed one-line view of the preview fields that are present
    pub fn preview(&self, delimiter: &str) -> String {
        PREVIEW_FIELDS
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_builder() {
        let record = Record::new("ibge", RecordKind::MunicipalityStat)
            .with(FIELD_NAME, "Maceió")
            .with("codigo_ibge", 2704302i64);

        assert_eq!(record.source_id(), "ibge");
        assert_eq!(record.kind(), RecordKind::MunicipalityStat);
        assert_eq!(record.get(FIELD_NAME), Some(&FieldValue::from("Maceió")));
        assert_eq!(record.get("codigo_ibge").and_then(|v| v.as_i64()), Some(2704302));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new("ibge", RecordKind::MunicipalityStat)
            .with(FIELD_NAME, "Maceió")
            .with("microrregiao", FieldValue::Null);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "source_id": "ibge",
                "record_kind": "municipality_stat",
                "nome": "Maceió",
                "microrregiao": null
            })
        );
    }

    #[test]
    fn test_non_finite_float_falls_back_to_string() {
        let value = serde_json::to_value(FieldValue::Float(f64::NAN)).unwrap();
        assert_eq!(value, json!("NaN"));
    }

    #[test]
    fn test_from_json_value() {
        let value = FieldValue::from(json!({"a": [1, 2.5, "x"], "b": null}));
        let FieldValue::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map.get("a"),
            Some(&FieldValue::List(vec![
                FieldValue::Integer(1),
                FieldValue::Float(2.5),
                FieldValue::from("x"),
            ]))
        );
        assert_eq!(map.get("b"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_from_numeric_text() {
        assert_eq!(FieldValue::from_numeric_text("1031597"), FieldValue::Integer(1031597));
        assert_eq!(FieldValue::from_numeric_text("12.5"), FieldValue::Float(12.5));
        assert_eq!(FieldValue::from_numeric_text("N/A"), FieldValue::from("N/A"));
        assert_eq!(FieldValue::from_numeric_text("NaN"), FieldValue::from("NaN"));
    }

    #[test]
    fn test_display_for_flat_outputs() {
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::from("texto").to_string(), "texto");
        assert_eq!(
            FieldValue::from(vec!["a".to_string(), "b".to_string()]).to_string(),
            r#"["a","b"]"#
        );
    }

    #[test]
    fn test_preview_priority_order() {
        let record = Record::new("portal", RecordKind::InquiryService)
            .with(FIELD_SERVICE, "Consulta IPTU")
            .with(FIELD_URL, "https://example.com/iptu")
            .with(FIELD_SOURCE, "Portal")
            .with("href", "/iptu");

        assert_eq!(
            record.preview(" | "),
            "Portal | https://example.com/iptu | Consulta IPTU"
        );
    }

    #[test]
    fn test_preview_skips_null_fields() {
        let record = Record::new("ibge", RecordKind::MunicipalityStat)
            .with(FIELD_SOURCE, "IBGE")
            .with(FIELD_NAME, FieldValue::Null);

        assert_eq!(record.preview(" | "), "IBGE");
    }
}
