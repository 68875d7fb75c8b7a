//! Declarative Loopio → OCM field map.
//!
//! A [`FieldMap`] turns one library entry into one [`DestinationAsset`].
//! The transformation is total: missing source fields simply leave the
//! corresponding destination value absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset::{AssetTarget, DestinationAsset, TagSet};
use crate::path::FieldPath;

// ---------------------------------------------------------------------------
// FieldRule
// ---------------------------------------------------------------------------

/// How one destination field is derived from a source record.
///
/// Loaded from JSON as `{"type": "text", "id": "loopioId", "source": "id"}`,
/// `{"type": "structured", "id": "loopioData"}` or
/// `{"type": "projected", "id": "summary", "fields": ["id", "questions[0].text"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldRule {
    /// Copy the single value found at `source`.
    Text {
        /// Destination field id.
        id: String,
        /// Path of the value in the source record.
        source: FieldPath,
    },
    /// Embed the whole source record verbatim.
    #[serde(alias = "json")]
    Structured {
        /// Destination field id.
        id: String,
    },
    /// Embed an object holding only the listed paths, keyed by path.
    Projected {
        /// Destination field id.
        id: String,
        /// Paths to copy into the embedded object.
        fields: Vec<FieldPath>,
    },
}

impl FieldRule {
    /// Destination field id written by this rule.
    pub fn id(&self) -> &str {
        match self {
            Self::Text { id, .. } | Self::Structured { id } | Self::Projected { id, .. } => id,
        }
    }

    /// Derive the field value, or `None` when the source has nothing to copy.
    pub fn apply(&self, record: &Value) -> Option<Value> {
        match self {
            Self::Text { source, .. } => source.resolve(record).cloned(),
            Self::Structured { .. } => Some(record.clone()),
            Self::Projected { fields, .. } => {
                let projection: Map<String, Value> = fields
                    .iter()
                    .filter_map(|path| path.resolve(record).map(|v| (path.to_string(), v.clone())))
                    .collect();
                Some(Value::Object(projection))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FieldMap
// ---------------------------------------------------------------------------

/// The complete mapping from a library entry to an OCM asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    /// OCM content type of created items.
    pub asset_type: String,
    /// Path of the value used as the item name.
    pub name: FieldPath,
    /// Path of the tag array.
    pub tags: FieldPath,
    /// Field rules, applied in order.
    pub fields: Vec<FieldRule>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            asset_type: "LoopioItem".to_string(),
            name: FieldPath::key("id"),
            tags: FieldPath::key("tags"),
            fields: vec![
                FieldRule::Text {
                    id: "loopioId".to_string(),
                    source: FieldPath::key("id"),
                },
                FieldRule::Structured {
                    id: "loopioData".to_string(),
                },
            ],
        }
    }
}

impl FieldMap {
    /// Build the asset for one source record.
    ///
    /// When two rules share an id, the later one wins.
    pub fn transform(&self, record: &Value, target: &AssetTarget) -> DestinationAsset {
        let mut fields = Map::new();
        for rule in &self.fields {
            if let Some(value) = rule.apply(record) {
                fields.insert(rule.id().to_string(), value);
            }
        }

        DestinationAsset {
            repository_id: target.repository_id.clone(),
            asset_type: self.asset_type.clone(),
            name: self.name.resolve(record).cloned(),
            language: target.language.clone(),
            translatable: true,
            fields,
            tags: TagSet::from_source(self.tags.resolve(record)),
        }
    }
}
