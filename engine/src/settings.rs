//! Index settings applied when a collection is (re)indexed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-collection search index settings.
///
/// Known attributes are typed; anything else the engine understands is kept
/// verbatim in `extra` and sent alongside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
    /// Engine-specific settings passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IndexSettings {
    /// True when nothing would be sent to the engine.
    pub fn is_empty(&self) -> bool {
        self.filterable_attributes.is_none()
            && self.searchable_attributes.is_none()
            && self.synonyms.is_none()
            && self.extra.is_empty()
    }
}
