//! Entry transform pipeline.
//!
//! Raw host entries go through three stages before they reach the search
//! engine, always in this order:
//!
//! 1. **filter** on the raw entries (default: accept all)
//! 2. **transform** on the accepted remainder (default: identity)
//! 3. **annotate** with the `_search_id` document id
//!
//! A failing filter, a failing transform, or a transform producing anything
//! but a JSON object aborts the whole batch: nothing of it is indexed.

use crate::entry::natural_id;
use crate::error::PipelineAction;
use crate::id::{annotate_entries, Annotated};
use crate::registry::CollectionConfig;
use crate::{CollectionName, Entry, Error, NaturalId, Registry};

/// Result of filtering a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    pub accepted: Vec<Entry>,
    pub rejected: Vec<Entry>,
}

/// Apply the collection's filter, preserving order.
///
/// Returns [`Error::TransformAborted`] with [`PipelineAction::Filtered`] if
/// the predicate fails for any entry.
pub fn filter_entries(
    config: Option<&CollectionConfig>,
    collection: &str,
    entries: Vec<Entry>,
) -> Result<Filtered, Error> {
    let Some(filter) = config.and_then(CollectionConfig::filter) else {
        return Ok(Filtered {
            accepted: entries,
            rejected: Vec::new(),
        });
    };

    let mut filtered = Filtered::default();
    for entry in entries {
        match filter(&entry) {
            Ok(true) => filtered.accepted.push(entry),
            Ok(false) => filtered.rejected.push(entry),
            Err(reason) => return Err(abort(collection, PipelineAction::Filtered, reason)),
        }
    }
    Ok(filtered)
}

/// Apply the collection's transform to every entry.
///
/// All or nothing: the first failure or non-object output aborts the batch.
pub fn transform_entries(
    config: Option<&CollectionConfig>,
    collection: &str,
    entries: Vec<Entry>,
) -> Result<Vec<Entry>, Error> {
    let Some(transform) = config.and_then(CollectionConfig::transform) else {
        return Ok(entries);
    };

    let mut transformed = Vec::with_capacity(entries.len());
    for entry in entries {
        let output = transform(entry)
            .map_err(|reason| abort(collection, PipelineAction::Transformed, reason))?;
        if !output.is_object() {
            return Err(abort(
                collection,
                PipelineAction::Transformed,
                format!("transform returned {} instead of an object", kind_of(&output)),
            ));
        }
        transformed.push(output);
    }
    Ok(transformed)
}

/// Documents ready for the search engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    pub collection: CollectionName,
    /// Annotated documents, in input order
    pub documents: Vec<Entry>,
    /// Natural ids of entries the filter rejected
    pub rejected: Vec<NaturalId>,
    /// Positions (after filtering) of entries dropped for lacking a natural id
    pub skipped: Vec<usize>,
    /// Set when the batch was aborted; `documents` and `rejected` are then empty
    pub aborted: Option<Error>,
}

impl Prepared {
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Run the full pipeline for one collection.
pub fn prepare_entries(registry: &Registry, collection: &str, entries: Vec<Entry>) -> Prepared {
    let config = registry.get(collection);
    let id_field = config.and_then(|c| c.id_field.as_deref());

    let mut prepared = Prepared {
        collection: collection.to_string(),
        ..Default::default()
    };

    let accepted = match filter_entries(config, collection, entries) {
        Ok(filtered) => {
            prepared.rejected = filtered
                .rejected
                .iter()
                .filter_map(|entry| natural_id(entry, id_field))
                .collect();
            filtered.accepted
        }
        Err(err) => {
            prepared.aborted = Some(err);
            return prepared;
        }
    };

    let transformed = match transform_entries(config, collection, accepted) {
        Ok(transformed) => transformed,
        Err(err) => {
            prepared.rejected.clear();
            prepared.aborted = Some(err);
            return prepared;
        }
    };

    let Annotated { entries, skipped } =
        annotate_entries(&prepared.collection, id_field, transformed);
    prepared.documents = entries;
    prepared.skipped = skipped;
    prepared
}

fn abort(collection: &str, action: PipelineAction, reason: String) -> Error {
    Error::TransformAborted {
        collection: collection.to_string(),
        action,
        reason,
    }
}

fn kind_of(value: &Entry) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
