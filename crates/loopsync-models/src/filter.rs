//! Loopio library-entry filter expression.
//!
//! The source API accepts a single `filter` query parameter.  It is built
//! from an ordered list of `key=value` pairs joined with `;`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator placed between rendered filter entries.
pub const FILTER_SEPARATOR: &str = ";";

/// One `key=value` pair of a [`SourceFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    /// Filter key (e.g. `language`).
    pub key: String,
    /// Filter value; see [`FilterEntry::render`] for how it is written.
    pub value: Value,
}

impl FilterEntry {
    /// Create an entry.
    pub fn new(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }

    /// Render as `key=value`.
    ///
    /// Strings are written raw, arrays as their rendered elements joined
    /// by `,`, and anything else as compact JSON.
    pub fn render(&self) -> String {
        format!("{}={}", self.key, render_value(&self.value))
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Ordered filter applied to the library-entries query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFilter {
    entries: Vec<FilterEntry>,
}

impl SourceFilter {
    /// Build a filter from its entries, preserving order.
    pub fn new(entries: Vec<FilterEntry>) -> Self {
        Self { entries }
    }

    /// The configured entries.
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// `true` when no entries are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the whole filter expression.
    pub fn to_query(&self) -> String {
        self.entries
            .iter()
            .map(FilterEntry::render)
            .collect::<Vec<_>>()
            .join(FILTER_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_in_configured_order() {
        let filter = SourceFilter::new(vec![
            FilterEntry::new("language", "en"),
            FilterEntry::new("tags", json!(["PullYes"])),
        ]);
        assert_eq!(filter.to_query(), "language=en;tags=PullYes");
    }

    #[test]
    fn object_values_render_as_json() {
        let entry = FilterEntry::new("lastUpdatedDate", json!({ "gte": "2022-01-01T00:00:00Z" }));
        assert_eq!(entry.render(), r#"lastUpdatedDate={"gte":"2022-01-01T00:00:00Z"}"#);
    }

    #[test]
    fn arrays_join_with_commas() {
        let entry = FilterEntry::new("tags", json!(["A", "B", 3]));
        assert_eq!(entry.render(), "tags=A,B,3");
    }

    #[test]
    fn empty_filter_renders_empty() {
        assert_eq!(SourceFilter::default().to_query(), "");
    }

    #[test]
    fn deserializes_from_entry_list() {
        let filter: SourceFilter =
            serde_json::from_value(json!([{ "key": "language", "value": "fr" }])).unwrap();
        assert_eq!(filter.entries().len(), 1);
        assert_eq!(filter.to_query(), "language=fr");
    }
}
