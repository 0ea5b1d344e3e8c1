//! # Sift Engine
//!
//! Policy for keeping search indexes consistent with a host's data collections.
//!
//! This crate decides *what* gets sent to the search engine and *when*. It has
//! no IO: fetching entries, persisting state and talking to the search engine
//! are left to the caller (see the `sift-server` crate).
//!
//! ## Core Concepts
//!
//! ### Registry
//!
//! The [`Registry`] knows every configured collection and the index (or
//! indexes) it writes to. Several collections may share one index, forming a
//! composite index. Unknown collections resolve to an index of their own name.
//!
//! ### Document ids
//!
//! Every document carries a `_search_id` of the form `"{collection}-{natural_id}"`
//! (see [`make_document_id`]), so documents from different collections never
//! collide inside a composite index.
//!
//! ### Pipeline
//!
//! [`prepare_entries`] filters raw entries, transforms the accepted ones and
//! annotates them with their document id. A failing filter or transform
//! aborts the whole batch.
//!
//! ### Events
//!
//! A [`MutationEvent`] from the host is turned into a [`SyncAction`] by
//! [`MutationEvent::plan`]. Bulk creates and updates are refused.
//!
//! ## Quick Start
//!
//! ```rust
//! use sift_engine::{prepare_entries, CollectionConfig, Registry};
//! use serde_json::{json, Value};
//!
//! let registry = Registry::new().with_collection(
//!     CollectionConfig::new("restaurant")
//!         .index_name("my_restaurant")
//!         .transform_entry(|mut entry| {
//!             let names: Vec<Value> = entry["categories"]
//!                 .as_array()
//!                 .map(|c| c.iter().map(|c| c["name"].clone()).collect())
//!                 .unwrap_or_default();
//!             entry["categories"] = Value::Array(names);
//!             Ok(entry)
//!         }),
//! );
//!
//! let entry = json!({"id": 1, "documentId": "abc", "categories": [{"name": "Italian"}]});
//! let prepared = prepare_entries(&registry, "restaurant", vec![entry]);
//!
//! assert_eq!(registry.index_name("restaurant"), "my_restaurant");
//! assert_eq!(
//!     prepared.documents,
//!     vec![json!({
//!         "id": 1,
//!         "documentId": "abc",
//!         "categories": ["Italian"],
//!         "_search_id": "restaurant-abc"
//!     })]
//! );
//! ```

pub mod classify;
pub mod credentials;
pub mod entry;
pub mod error;
pub mod event;
pub mod id;
pub mod pipeline;
pub mod registry;
pub mod settings;

// Re-export main types at crate root
pub use classify::{classify, Classified, ErrorBody, ErrorKind, ErrorMessage};
pub use credentials::{Credentials, ResolvedCredentials};
pub use entry::{natural_id, SEARCH_ID_FIELD};
pub use error::{Error, PipelineAction, Result};
pub use event::{EventKind, EventParams, MutationEvent, SyncAction};
pub use id::{annotate_entries, make_document_id, natural_id_of, Annotated};
pub use pipeline::{filter_entries, prepare_entries, transform_entries, Filtered, Prepared};
pub use registry::{CollectionConfig, CollectionDescriptor, FilterFn, Registry, TransformFn};
pub use settings::IndexSettings;

/// Type aliases for clarity
pub type CollectionName = String;
pub type IndexName = String;
pub type NaturalId = String;
pub type DocumentId = String;
pub type Entry = serde_json::Value;
