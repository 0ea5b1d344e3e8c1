//! Document id adapter.
//!
//! Composite indexes hold documents from several collections, so every
//! document id is prefixed with the collection it came from:
//! `"{collection}-{natural_id}"`.

use crate::entry::{natural_id, SEARCH_ID_FIELD};
use crate::{CollectionName, DocumentId, Entry};
use serde_json::Value;

/// Separator between the collection name and the natural id.
pub const ID_SEPARATOR: char = '-';

/// Build the search document id of an entry.
///
/// Natural ids may contain the separator themselves (UUIDs, negative
/// numbers), so a document id can only be taken apart when its collection is
/// known: see [`natural_id_of`] and [`crate::Registry::split_document_id`].
/// Ids of one collection never collide. Across collections they can when one
/// name extends another with a separator (`blog` and `blog-post`).
pub fn make_document_id(collection: &str, natural_id: &str) -> DocumentId {
    format!("{collection}{ID_SEPARATOR}{natural_id}")
}

/// Natural id inside a document id of `collection`, or `None` if the
/// document id does not belong to it.
pub fn natural_id_of<'a>(collection: &str, document_id: &'a str) -> Option<&'a str> {
    let id = document_id
        .strip_prefix(collection)?
        .strip_prefix(ID_SEPARATOR)?;
    if collection.is_empty() || id.is_empty() {
        return None;
    }
    Some(id)
}

/// Entries carrying a search id, plus the positions that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotated {
    pub entries: Vec<Entry>,
    /// Input positions of entries without a natural id
    pub skipped: Vec<usize>,
}

/// Attach [`SEARCH_ID_FIELD`] to every entry that has a natural id.
///
/// Entries without one (or that are not JSON objects) are left out and
/// reported in [`Annotated::skipped`]; order is otherwise preserved.
pub fn annotate_entries(
    collection: &CollectionName,
    id_field: Option<&str>,
    entries: Vec<Entry>,
) -> Annotated {
    let mut annotated = Annotated {
        entries: Vec::with_capacity(entries.len()),
        skipped: Vec::new(),
    };

    for (position, mut entry) in entries.into_iter().enumerate() {
        let Some(id) = natural_id(&entry, id_field) else {
            annotated.skipped.push(position);
            continue;
        };
        let Some(fields) = entry.as_object_mut() else {
            annotated.skipped.push(position);
            continue;
        };

        fields.insert(
            SEARCH_ID_FIELD.to_string(),
            Value::String(make_document_id(collection, &id)),
        );
        annotated.entries.push(entry);
    }

    annotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_id_format() {
        assert_eq!(make_document_id("restaurant", "abc"), "restaurant-abc");
        assert_eq!(make_document_id("c", "4"), "c-4");
    }

    #[test]
    fn natural_id_keeps_separators() {
        assert_eq!(natural_id_of("restaurant", "restaurant-abc"), Some("abc"));
        assert_eq!(
            natural_id_of("users", "users-0b9f1c2e-5d3a-4c1e-9a8b-1f2e3d4c5b6a"),
            Some("0b9f1c2e-5d3a-4c1e-9a8b-1f2e3d4c5b6a")
        );
        assert_eq!(natural_id_of("n", "n--42"), Some("-42"));
        assert_eq!(natural_id_of("blog", "blog-post-42"), Some("post-42"));
        assert_eq!(natural_id_of("blog-post", "blog-post-42"), Some("42"));
    }

    #[test]
    fn foreign_document_id_has_no_natural_id() {
        assert_eq!(natural_id_of("movies", "restaurant-abc"), None);
        assert_eq!(natural_id_of("movies", "moviesabc"), None);
        assert_eq!(natural_id_of("movies", "movies-"), None);
        assert_eq!(natural_id_of("", "-42"), None);
    }

    #[test]
    fn annotate_skips_entries_without_id() {
        let entries = vec![
            json!({"id": 1, "documentId": "a"}),
            json!({"title": "orphan"}),
            json!({"id": 3}),
            json!("scalar"),
        ];

        let annotated = annotate_entries(&"movies".to_string(), None, entries);

        assert_eq!(annotated.skipped, vec![1, 3]);
        assert_eq!(annotated.entries.len(), 2);
        assert_eq!(annotated.entries[0][SEARCH_ID_FIELD], "movies-a");
        assert_eq!(annotated.entries[1][SEARCH_ID_FIELD], "movies-3");
    }

    #[test]
    fn annotate_uses_configured_id_field() {
        let entries = vec![json!({"id": 1, "documentId": "a", "sku": "X1"})];
        let annotated = annotate_entries(&"pants".to_string(), Some("sku"), entries);
        assert_eq!(annotated.entries[0][SEARCH_ID_FIELD], "pants-X1");
    }
}
