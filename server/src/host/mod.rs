//! Contracts the host application fulfils.
//!
//! The host owns the data: it fetches entries on request and emits a
//! [`MutationEvent`] after every write to a subscribed collection.

mod http;
mod hub;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use sift_engine::{Entry, MutationEvent, Result};
use tokio::sync::mpsc;

pub use http::HttpEntrySource;
pub use hub::EventHub;

/// Sender half of a collection subscription.
pub type EventSender = mpsc::UnboundedSender<MutationEvent>;

/// Read access to host entries.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Complete current representation of an entry, `None` if it does not exist
    /// (or is not visible, e.g. unpublished).
    async fn fetch_entry(
        &self,
        collection: &str,
        id: &str,
        populate: Option<&Value>,
    ) -> Result<Option<Entry>>;

    /// One page of a collection's entries, in a stable order.
    async fn fetch_entries(
        &self,
        collection: &str,
        start: usize,
        limit: usize,
        populate: Option<&Value>,
    ) -> Result<Vec<Entry>>;
}

/// Mutation event subscriptions.
pub trait Lifecycle: Send + Sync {
    /// Route events of `collection` to `sender`, replacing any earlier
    /// subscriber. Returns the subscription id.
    fn subscribe(&self, collection: &str, sender: EventSender) -> String;

    /// Returns `false` if nothing was subscribed.
    fn unsubscribe(&self, collection: &str) -> bool;

    /// Whether subscriptions can be rebuilt without restarting the host.
    fn supports_live_reload(&self) -> bool;
}
