//! Synchronization between host collections and search indexes.
//!
//! The [`Dispatcher`] reacts to host mutation events; the [`SyncService`]
//! runs administrative operations on top of it.

mod dispatcher;
mod service;

pub use dispatcher::Dispatcher;
pub use service::*;

use sift_engine::Prepared;

/// Log what the pipeline dropped. An abort is logged once, naming the
/// collection and the failed action.
fn log_prepared(prepared: &Prepared) {
    if let Some(error) = &prepared.aborted {
        tracing::error!(collection = %prepared.collection, error = %error, "Entries not indexed");
        return;
    }
    for position in &prepared.skipped {
        tracing::warn!(
            collection = %prepared.collection,
            position,
            "Entry has no natural id and was skipped"
        );
    }
}
