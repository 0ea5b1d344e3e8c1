//! Entry helpers.
//!
//! Entries are opaque JSON documents owned by the host. The only thing the
//! engine reads from them is the natural id, and the only thing it writes is
//! the [`SEARCH_ID_FIELD`].

use crate::{Entry, NaturalId};
use serde_json::Value;

/// Field the id adapter attaches to every document sent to the search engine.
pub const SEARCH_ID_FIELD: &str = "_search_id";

/// Stable identifier that survives draft/publish duplication.
pub const DOCUMENT_ID_FIELD: &str = "documentId";

/// Internal row id, used only when the host exposes no stable identifier.
pub const ROW_ID_FIELD: &str = "id";

/// Read the natural id of an entry.
///
/// With an explicit `id_field` only that field is consulted. Otherwise the
/// stable `documentId` wins over the row `id`. Strings and numbers are
/// accepted; empty strings, nulls and any other JSON type count as absent.
pub fn natural_id(entry: &Entry, id_field: Option<&str>) -> Option<NaturalId> {
    match id_field {
        Some(field) => id_value(entry.get(field)?),
        None => entry
            .get(DOCUMENT_ID_FIELD)
            .and_then(id_value)
            .or_else(|| entry.get(ROW_ID_FIELD).and_then(id_value)),
    }
}

/// Convert a JSON scalar into a natural id.
pub fn id_value(value: &Value) -> Option<NaturalId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
