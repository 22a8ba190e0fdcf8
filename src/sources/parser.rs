//! HTML and JSON extraction helpers
//!
//! This module handles the parsing side of every adapter:
//! - Keyword matching over link labels
//! - Form input reconnaissance
//! - Keyword counting over leading container elements
//! - Null-safe nested lookups in JSON documents
//!
//! All HTML helpers are synchronous and take the body as text, so no parsed
//! document is ever held across an await point.

use crate::model::{FieldValue, SourceError};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// A link whose label matched one of the keywords
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordLink {
    /// Visible text, whitespace collapsed
    pub label: String,
    /// Raw `href` attribute, if any
    pub href: Option<String>,
    /// `href` resolved against the page URL when possible
    pub url: Option<String>,
}

/// A named `<input>` element
#[derive(Debug, Clone, PartialEq)]
pub struct InputDescriptor {
    pub name: String,
    pub input_type: String,
    pub placeholder: Option<String>,
}

/// Lowercases, trims and drops empty keywords
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Case-insensitive containment test against normalized keywords
pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lowered = text.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k.as_str()))
}

/// Visible text of an element with runs of whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects every anchor whose label contains one of `keywords`
///
/// `keywords` must already be normalized with [`normalize_keywords`].
/// Duplicates are kept.
pub fn find_keyword_links(html: &str, page_url: &str, keywords: &[String]) -> Vec<KeywordLink> {
    let document = Html::parse_document(html);
    let base_url = Url::parse(page_url).ok();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let label = element_text(&element);
        if label.is_empty() || !contains_keyword(&label, keywords) {
            continue;
        }

        let href = element.value().attr("href").map(|h| h.trim().to_string());
        let url = href.as_deref().map(|h| resolve_link(h, base_url.as_ref()));

        tracing::trace!("Keyword link '{}' -> {:?}", label, href);
        links.push(KeywordLink { label, href, url });
    }

    links
}

/// Resolves an href against the page URL, falling back to the raw value
fn resolve_link(href: &str, base_url: Option<&Url>) -> String {
    base_url
        .and_then(|base| base.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// Describes every `<input>` carrying a `name` attribute
pub fn find_named_inputs(html: &str) -> Vec<InputDescriptor> {
    let document = Html::parse_document(html);

    let Ok(input_selector) = Selector::parse("input[name]") else {
        return Vec::new();
    };

    document
        .select(&input_selector)
        .filter_map(|element| {
            let attrs = element.value();
            let name = attrs.attr("name")?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(InputDescriptor {
                name,
                input_type: attrs.attr("type").unwrap_or("text").to_lowercase(),
                placeholder: attrs.attr("placeholder").map(|p| p.trim().to_string()),
            })
        })
        .collect()
}

/// Counts how many of the first `limit` containers mention a keyword
///
/// # Returns
///
/// * `Ok(count)` - Number of matching containers among the inspected prefix
/// * `Err(String)` - The container selector is invalid
pub fn count_keyword_containers(
    html: &str,
    container_selector: &str,
    limit: usize,
    keywords: &[String],
) -> Result<usize, String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(container_selector)
        .map_err(|e| format!("invalid selector '{}': {:?}", container_selector, e))?;

    let count = document
        .select(&selector)
        .take(limit)
        .filter(|element| contains_keyword(&element_text(element), keywords))
        .count();

    Ok(count)
}

/// Extracts the page title (from the `<title>` tag)
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Decodes a JSON body
pub fn parse_json(body: &str, url: &str) -> Result<Value, SourceError> {
    serde_json::from_str(body).map_err(|e| SourceError::ParseFailure {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Follows a dotted path through objects and arrays
///
/// Numeric segments index into arrays; any other segment is an object key.
/// Returns `None` as soon as a step is missing or has the wrong shape.
///
/// ```
/// use condo_harvest::sources::lookup;
/// use serde_json::json;
///
/// let doc = json!({"a": [{"b": 1}]});
/// assert_eq!(lookup(&doc, "a.0.b"), Some(&json!(1)));
/// assert_eq!(lookup(&doc, "a.1.b"), None);
/// ```
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Like [`lookup`], converted to a field value (`Null` when absent)
pub fn lookup_field(value: &Value, path: &str) -> FieldValue {
    lookup(value, path).map(FieldValue::from).unwrap_or(FieldValue::Null)
}
