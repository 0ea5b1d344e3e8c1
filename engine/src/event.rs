//! Mutation events emitted by the host and the sync action each one implies.

use crate::entry::{id_value, natural_id, DOCUMENT_ID_FIELD, ROW_ID_FIELD};
use crate::{error::Result, CollectionName, Entry, Error, NaturalId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle hook that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    AfterCreate,
    AfterCreateMany,
    AfterUpdate,
    AfterUpdateMany,
    AfterDelete,
    AfterDeleteMany,
}

impl EventKind {
    pub fn is_bulk(&self) -> bool {
        matches!(
            self,
            EventKind::AfterCreateMany | EventKind::AfterUpdateMany | EventKind::AfterDeleteMany
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::AfterCreate => "afterCreate",
            EventKind::AfterCreateMany => "afterCreateMany",
            EventKind::AfterUpdate => "afterUpdate",
            EventKind::AfterUpdateMany => "afterUpdateMany",
            EventKind::AfterDelete => "afterDelete",
            EventKind::AfterDeleteMany => "afterDeleteMany",
        };
        write!(f, "{name}")
    }
}

/// Query parameters of the mutation that fired the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    /// Entry data (or list of entries) written by the mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Selection of a bulk mutation, e.g. `{"id": {"in": [4, 5, 6]}}`
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
}

/// A data-mutation event for one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub collection: CollectionName,
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Entry (or bulk result) as returned by the mutation; may be partial
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Entry>,
    #[serde(default)]
    pub params: EventParams,
}

/// What the dispatcher has to do for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Fetch the entry and add it
    Add(NaturalId),
    /// Fetch the entry and re-add it (or remove it if it is gone)
    Update(NaturalId),
    /// Remove these entries
    Delete(Vec<NaturalId>),
}

impl MutationEvent {
    pub fn new(collection: impl Into<CollectionName>, kind: EventKind) -> Self {
        Self {
            collection: collection.into(),
            kind,
            result: None,
            params: EventParams::default(),
        }
    }

    pub fn with_result(mut self, result: Entry) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.params.data = Some(data);
        self
    }

    pub fn with_where(mut self, selection: Value) -> Self {
        self.params.selection = Some(selection);
        self
    }

    /// Decide the sync action for this event.
    ///
    /// Bulk creates and updates are refused with
    /// [`Error::UnsupportedBulkOperation`]; bulk deletes are supported.
    pub fn plan(&self, id_field: Option<&str>) -> Result<SyncAction> {
        match self.kind {
            EventKind::AfterCreate => self.entry_id(id_field).map(SyncAction::Add),
            EventKind::AfterUpdate => self.entry_id(id_field).map(SyncAction::Update),
            EventKind::AfterCreateMany | EventKind::AfterUpdateMany => {
                Err(Error::UnsupportedBulkOperation {
                    collection: self.collection.clone(),
                    event: self.kind.to_string(),
                })
            }
            EventKind::AfterDelete | EventKind::AfterDeleteMany => {
                let ids = self.deleted_ids(id_field);
                if ids.is_empty() {
                    return Err(self.missing_id());
                }
                Ok(SyncAction::Delete(ids))
            }
        }
    }

    fn entry_id(&self, id_field: Option<&str>) -> Result<NaturalId> {
        self.result
            .as_ref()
            .and_then(|result| natural_id(result, id_field))
            .or_else(|| self.params.data.as_ref().and_then(|d| natural_id(d, id_field)))
            .ok_or_else(|| self.missing_id())
    }

    /// Ids of deleted entries: the returned entry (or entries) first, then
    /// the bulk selection.
    fn deleted_ids(&self, id_field: Option<&str>) -> Vec<NaturalId> {
        let from_result: Vec<NaturalId> = match &self.result {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| natural_id(entry, id_field))
                .collect(),
            Some(entry) => natural_id(entry, id_field).into_iter().collect(),
            None => Vec::new(),
        };
        if !from_result.is_empty() {
            return from_result;
        }

        let Some(selection) = &self.params.selection else {
            return Vec::new();
        };
        match id_field {
            Some(field) => selected_ids(selection, field),
            None => {
                let ids = selected_ids(selection, DOCUMENT_ID_FIELD);
                if ids.is_empty() {
                    selected_ids(selection, ROW_ID_FIELD)
                } else {
                    ids
                }
            }
        }
    }

    fn missing_id(&self) -> Error {
        Error::Host(format!(
            "'{}' event on collection '{}' carries no entry id",
            self.kind, self.collection
        ))
    }
}

/// Ids selected on `field`: a scalar, `{"in": [...]}`, `{"$in": [...]}` or `{"$eq": x}`.
fn selected_ids(selection: &Value, field: &str) -> Vec<NaturalId> {
    let Some(condition) = selection.get(field) else {
        return Vec::new();
    };

    if let Some(id) = id_value(condition) {
        return vec![id];
    }

    let listed = condition.get("in").or_else(|| condition.get("$in"));
    if let Some(Value::Array(values)) = listed {
        return values.iter().filter_map(id_value).collect();
    }

    condition
        .get("$eq")
        .and_then(id_value)
        .into_iter()
        .collect()
}
