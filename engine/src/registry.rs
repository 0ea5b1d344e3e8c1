//! Collection registry.
//!
//! Static knowledge of which collections exist, which index each writes to,
//! and how each one's entries are filtered and transformed. Combined with the
//! persisted listened/indexed sets it yields [`CollectionDescriptor`]s.

use crate::id::natural_id_of;
use crate::{error::Result, CollectionName, Entry, Error, IndexName, IndexSettings};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Predicate deciding whether an entry should be indexed.
pub type FilterFn = Arc<dyn Fn(&Entry) -> std::result::Result<bool, String> + Send + Sync>;

/// Mapping applied to an entry before it is indexed.
pub type TransformFn = Arc<dyn Fn(Entry) -> std::result::Result<Entry, String> + Send + Sync>;

/// Configuration of a single collection.
#[derive(Clone)]
pub struct CollectionConfig {
    /// Collection name in the host
    pub name: CollectionName,
    /// Target indexes; empty means the collection's own name
    pub index_names: Vec<IndexName>,
    /// Natural id field; `None` prefers `documentId` then `id`
    pub id_field: Option<String>,
    /// Relation-population rule forwarded to the host when fetching
    pub populate: Option<serde_json::Value>,
    /// Settings applied at (re)index time
    pub settings: IndexSettings,
    filter: Option<FilterFn>,
    transform: Option<TransformFn>,
}

impl CollectionConfig {
    /// Create a configuration that indexes into an index of the same name.
    pub fn new(name: impl Into<CollectionName>) -> Self {
        Self {
            name: name.into(),
            index_names: Vec::new(),
            id_field: None,
            populate: None,
            settings: IndexSettings::default(),
            filter: None,
            transform: None,
        }
    }

    /// Write into `index` instead. May be called repeatedly to split a
    /// collection across several indexes.
    pub fn index_name(mut self, index: impl Into<IndexName>) -> Self {
        self.index_names.push(index.into());
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn populate(mut self, rule: serde_json::Value) -> Self {
        self.populate = Some(rule);
        self
    }

    pub fn settings(mut self, settings: IndexSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn filter_entry<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Entry) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn transform_entry<F>(mut self, transform: F) -> Self
    where
        F: Fn(Entry) -> std::result::Result<Entry, String> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn filter(&self) -> Option<&FilterFn> {
        self.filter.as_ref()
    }

    pub fn transform(&self) -> Option<&TransformFn> {
        self.transform.as_ref()
    }
}

impl std::fmt::Debug for CollectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("name", &self.name)
            .field("index_names", &self.index_names)
            .field("id_field", &self.id_field)
            .field("populate", &self.populate)
            .field("settings", &self.settings)
            .field("filter", &self.filter.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// One or many index names, as written in a collections file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IndexNames {
    One(IndexName),
    Many(Vec<IndexName>),
}

/// A collection as declared in a collections file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFileEntry {
    collection: CollectionName,
    #[serde(default)]
    index_name: Option<IndexNames>,
    #[serde(default)]
    id_field: Option<String>,
    #[serde(default)]
    populate: Option<serde_json::Value>,
    #[serde(default)]
    settings: IndexSettings,
}

impl From<CollectionFileEntry> for CollectionConfig {
    fn from(entry: CollectionFileEntry) -> Self {
        let mut config = CollectionConfig::new(entry.collection).settings(entry.settings);
        config.index_names = match entry.index_name {
            Some(IndexNames::One(name)) => vec![name],
            Some(IndexNames::Many(names)) => names,
            None => Vec::new(),
        };
        config.id_field = entry.id_field;
        config.populate = entry.populate;
        config
    }
}

/// Derived state of a collection, as shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescriptor {
    pub name: CollectionName,
    pub index_names: Vec<IndexName>,
    /// The dispatcher holds subscriptions for this collection
    pub listened: bool,
    /// At least one entry has been pushed
    pub indexed: bool,
}

impl CollectionDescriptor {
    /// A reload is needed exactly when listening and indexing disagree.
    pub fn reload_needed(&self) -> bool {
        self.listened != self.indexed
    }
}

/// Registered collections in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: Vec<CollectionConfig>,
    by_name: HashMap<CollectionName, usize>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a collections file (a JSON array of collection entries).
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CollectionFileEntry> = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid collections file: {e}")))?;

        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry.into());
        }
        Ok(registry)
    }

    /// Builder-style registration.
    pub fn with_collection(mut self, config: CollectionConfig) -> Self {
        self.register(config);
        self
    }

    /// Register a collection, replacing any earlier configuration of the
    /// same name while keeping its position.
    pub fn register(&mut self, config: CollectionConfig) {
        match self.by_name.get(&config.name) {
            Some(&idx) => self.collections[idx] = config,
            None => {
                self.by_name.insert(config.name.clone(), self.collections.len());
                self.collections.push(config);
            }
        }
    }

    /// Get a collection's configuration.
    pub fn get(&self, name: &str) -> Option<&CollectionConfig> {
        self.by_name.get(name).map(|&idx| &self.collections[idx])
    }

    /// Check if a collection is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered collection names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &CollectionName> {
        self.collections.iter().map(|c| &c.name)
    }

    /// Every index a collection writes to. Never empty: unknown or
    /// unconfigured collections resolve to themselves.
    pub fn index_names(&self, collection: &str) -> Vec<IndexName> {
        match self.get(collection) {
            Some(config) if !config.index_names.is_empty() => config.index_names.clone(),
            _ => vec![collection.to_string()],
        }
    }

    /// Primary index of a collection.
    pub fn index_name(&self, collection: &str) -> IndexName {
        self.get(collection)
            .and_then(|config| config.index_names.first().cloned())
            .unwrap_or_else(|| collection.to_string())
    }

    /// Registered collections writing into `index`, in registration order.
    pub fn collections_sharing_index(&self, index: &str) -> Vec<CollectionName> {
        self.collections
            .iter()
            .filter(|config| self.index_names(&config.name).iter().any(|i| i == index))
            .map(|config| config.name.clone())
            .collect()
    }

    /// Split a document id into `(collection, natural_id)` against the
    /// registered collection names. The longest matching name wins.
    pub fn split_document_id<'a>(&self, document_id: &'a str) -> Option<(&'a str, &'a str)> {
        let (name, id) = self
            .names()
            .filter_map(|name| natural_id_of(name, document_id).map(|id| (name, id)))
            .max_by_key(|(name, _)| name.len())?;
        Some((&document_id[..name.len()], id))
    }

    /// Project the registry over the persisted listened and indexed sets.
    ///
    /// Registered collections come first in registration order, followed by
    /// any persisted names the registry does not know about.
    pub fn list_collections(
        &self,
        listened: &[CollectionName],
        indexed: &[CollectionName],
    ) -> Vec<CollectionDescriptor> {
        let listened_set: HashSet<&str> = listened.iter().map(String::as_str).collect();
        let indexed_set: HashSet<&str> = indexed.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let names = self
            .names()
            .chain(listened.iter())
            .chain(indexed.iter())
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        names
            .into_iter()
            .map(|name| CollectionDescriptor {
                index_names: self.index_names(&name),
                listened: listened_set.contains(name.as_str()),
                indexed: indexed_set.contains(name.as_str()),
                name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products_registry() -> Registry {
        Registry::new()
            .with_collection(CollectionConfig::new("shirts").index_name("products"))
            .with_collection(CollectionConfig::new("pants").index_name("products"))
            .with_collection(CollectionConfig::new("restaurant").index_name("my_restaurant"))
    }

    #[test]
    fn unknown_collection_resolves_to_itself() {
        let registry = products_registry();
        assert_eq!(registry.index_name("movies"), "movies");
        assert_eq!(registry.index_names("movies"), vec!["movies".to_string()]);
    }

    #[test]
    fn unconfigured_index_defaults_to_collection_name() {
        let registry = Registry::new().with_collection(CollectionConfig::new("movies"));
        assert_eq!(registry.index_name("movies"), "movies");
    }

    #[test]
    fn composite_index_in_registration_order() {
        let registry = products_registry();
        assert_eq!(
            registry.collections_sharing_index("products"),
            vec!["shirts".to_string(), "pants".to_string()]
        );
        assert_eq!(
            registry.collections_sharing_index("my_restaurant"),
            vec!["restaurant".to_string()]
        );
        assert!(registry.collections_sharing_index("nothing").is_empty());
    }

    #[test]
    fn split_collection_writes_to_every_index() {
        let registry = Registry::new().with_collection(
            CollectionConfig::new("articles")
                .index_name("articles_en")
                .index_name("everything"),
        );
        assert_eq!(registry.index_name("articles"), "articles_en");
        assert_eq!(
            registry.index_names("articles"),
            vec!["articles_en".to_string(), "everything".to_string()]
        );
        assert_eq!(
            registry.collections_sharing_index("everything"),
            vec!["articles".to_string()]
        );
    }

    #[test]
    fn reregistering_keeps_position() {
        let registry = products_registry()
            .with_collection(CollectionConfig::new("shirts").index_name("tops"));
        let names: Vec<_> = registry.names().cloned().collect();
        assert_eq!(names, vec!["shirts", "pants", "restaurant"]);
        assert_eq!(registry.index_name("shirts"), "tops");
    }

    #[test]
    fn from_json_collections_file() {
        let registry = Registry::from_json(
            r#"[
                {"collection": "shirts", "indexName": "products"},
                {"collection": "pants", "indexName": ["products", "bottoms"], "idField": "sku"},
                {
                    "collection": "movies",
                    "populate": ["cover"],
                    "settings": {"filterableAttributes": ["genre"]}
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.collections_sharing_index("products"), vec!["shirts", "pants"]);
        assert_eq!(registry.index_names("pants"), vec!["products", "bottoms"]);
        assert_eq!(registry.get("pants").unwrap().id_field.as_deref(), Some("sku"));

        let movies = registry.get("movies").unwrap();
        assert_eq!(movies.index_names, Vec::<String>::new());
        assert_eq!(movies.populate, Some(serde_json::json!(["cover"])));
        assert_eq!(
            movies.settings.filterable_attributes,
            Some(vec!["genre".to_string()])
        );
    }

    #[test]
    fn from_json_rejects_garbage() {
        let result = Registry::from_json(r#"{"shirts": {}}"#);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn descriptors_flag_reload_needed() {
        let registry = products_registry();
        let listened = vec!["shirts".to_string(), "pants".to_string()];
        let indexed = vec!["shirts".to_string(), "legacy".to_string()];

        let descriptors = registry.list_collections(&listened, &indexed);
        let names: Vec<_> = descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["shirts", "pants", "restaurant", "legacy"]);

        let shirts = &descriptors[0];
        assert!(shirts.listened && shirts.indexed && !shirts.reload_needed());

        let pants = &descriptors[1];
        assert!(pants.listened && !pants.indexed && pants.reload_needed());

        let restaurant = &descriptors[2];
        assert!(!restaurant.listened && !restaurant.indexed && !restaurant.reload_needed());

        let legacy = &descriptors[3];
        assert_eq!(legacy.index_names, vec!["legacy".to_string()]);
        assert!(legacy.reload_needed());
    }

    #[test]
    fn split_document_id_uses_registered_names() {
        let registry = Registry::new()
            .with_collection(CollectionConfig::new("users"))
            .with_collection(CollectionConfig::new("blog"))
            .with_collection(CollectionConfig::new("blog-post"));

        assert_eq!(
            registry.split_document_id("users-0b9f1c2e-5d3a-4c1e"),
            Some(("users", "0b9f1c2e-5d3a-4c1e"))
        );
        assert_eq!(registry.split_document_id("users--7"), Some(("users", "-7")));
        assert_eq!(registry.split_document_id("blog-post-42"), Some(("blog-post", "42")));
        assert_eq!(registry.split_document_id("blog-7"), Some(("blog", "7")));
        assert_eq!(registry.split_document_id("movies-1"), None);
        assert_eq!(registry.split_document_id("users-"), None);
    }
}
