//! OCM content-item payloads.
//!
//! [`DestinationAsset`] serialises to the body expected by the OCM
//! management API `POST /items` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Destination-side constants stamped onto every asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTarget {
    /// OCM repository receiving the items.
    pub repository_id: String,
    /// Language tag of the created items (e.g. `en`).
    pub language: String,
}

/// A single OCM tag, `{"name": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag value, copied verbatim from the source record.
    pub name: Value,
}

/// The `tags` object of an asset, `{"data": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSet {
    /// Tags in source order.
    pub data: Vec<Tag>,
}

impl TagSet {
    /// Wrap every element of a tag array.
    ///
    /// Anything that is not an array (including a missing field) yields
    /// an empty set.
    pub fn from_source(tags: Option<&Value>) -> Self {
        let data = match tags {
            Some(Value::Array(items)) => items
                .iter()
                .map(|name| Tag { name: name.clone() })
                .collect(),
            _ => Vec::new(),
        };
        Self { data }
    }
}

/// A content item ready to be created in OCM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationAsset {
    /// Target repository.
    pub repository_id: String,
    /// Content type name (e.g. `LoopioItem`).
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Item name; omitted when the source record had no value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    /// Item language.
    pub language: String,
    /// Always `true` for synchronised items.
    pub translatable: bool,
    /// Content-type field values keyed by field id.
    pub fields: Map<String, Value>,
    /// Tags copied from the source record.
    pub tags: TagSet,
}

impl DestinationAsset {
    /// A printable label for logs and reports.
    pub fn label(&self) -> String {
        match &self.name {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "<unnamed>".to_string(),
        }
    }
}
