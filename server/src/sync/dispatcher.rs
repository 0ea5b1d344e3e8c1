//! Mutation event dispatcher.
//!
//! Each subscribed collection has one drain task reading its event channel.
//! Every event is then handled on its own task: the host never waits for
//! the search engine, and failures end in the log.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sift_engine::{
    classify, prepare_entries, Classified, CollectionName, Error, MutationEvent, NaturalId,
    Registry, Result, SyncAction,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::log_prepared;
use crate::host::{EntrySource, Lifecycle};
use crate::search::SearchFacade;
use crate::store::ConfigStore;

struct Subscription {
    id: String,
    drain: JoinHandle<()>,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    store: Arc<ConfigStore>,
    facade: Arc<SearchFacade>,
    source: Arc<dyn EntrySource>,
    lifecycle: Arc<dyn Lifecycle>,
    event_timeout: Duration,
    subscriptions: DashMap<CollectionName, Subscription>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<ConfigStore>,
        facade: Arc<SearchFacade>,
        source: Arc<dyn EntrySource>,
        lifecycle: Arc<dyn Lifecycle>,
        event_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            store,
            facade,
            source,
            lifecycle,
            event_timeout,
            subscriptions: DashMap::new(),
        }
    }

    /// Start handling mutation events of `collection`.
    ///
    /// Returns `false` if the collection was already subscribed.
    pub fn subscribe(self: &Arc<Self>, collection: &str) -> bool {
        let Entry::Vacant(slot) = self.subscriptions.entry(collection.to_string()) else {
            return false;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.lifecycle.subscribe(collection, tx);
        let drain = tokio::spawn(drain_events(Arc::downgrade(self), rx));
        slot.insert(Subscription { id, drain });
        true
    }

    /// Stop handling events of `collection`. Idempotent; events already
    /// dispatched still run to completion.
    pub fn unsubscribe(&self, collection: &str) -> bool {
        let Some((_, subscription)) = self.subscriptions.remove(collection) else {
            return false;
        };
        self.lifecycle.unsubscribe(collection);
        subscription.drain.abort();
        tracing::debug!(subscription = %subscription.id, collection, "Dispatcher detached");
        true
    }

    pub fn unsubscribe_all(&self) -> usize {
        let collections: Vec<CollectionName> =
            self.subscriptions.iter().map(|s| s.key().clone()).collect();
        collections
            .iter()
            .filter(|collection| self.unsubscribe(collection))
            .count()
    }

    #[cfg(test)]
    pub fn is_subscribed(&self, collection: &str) -> bool {
        self.subscriptions.contains_key(collection)
    }

    /// Synchronize one event. Never fails: errors are classified, logged and
    /// returned for inspection.
    pub async fn handle(&self, event: MutationEvent) -> Option<Classified> {
        let id_field = self
            .registry
            .get(&event.collection)
            .and_then(|config| config.id_field.as_deref());

        let action = match event.plan(id_field) {
            Ok(action) => action,
            Err(error) => return Some(self.report_failure(&event, &[], error).await),
        };

        let ids = match &action {
            SyncAction::Add(id) | SyncAction::Update(id) => vec![id.clone()],
            SyncAction::Delete(ids) => ids.clone(),
        };

        let applied = self.apply(&event.collection, action);
        let outcome = tokio::time::timeout(self.event_timeout, applied)
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(self.event_timeout.as_millis() as u64)));

        match outcome {
            Ok(()) => None,
            Err(error) => Some(self.report_failure(&event, &ids, error).await),
        }
    }

    async fn apply(&self, collection: &str, action: SyncAction) -> Result<()> {
        match action {
            SyncAction::Add(id) => self.sync_entry(collection, &id, false).await,
            SyncAction::Update(id) => self.sync_entry(collection, &id, true).await,
            SyncAction::Delete(ids) => {
                self.facade.delete_entries(collection, &ids).await?;
                tracing::debug!(collection, count = ids.len(), "Entries deleted");
                Ok(())
            }
        }
    }

    /// Fetch the complete entry and push it. On update, an entry that is gone
    /// or no longer passes the filter is removed from the index.
    async fn sync_entry(&self, collection: &str, id: &NaturalId, prune: bool) -> Result<()> {
        let populate = self
            .registry
            .get(collection)
            .and_then(|config| config.populate.as_ref());

        let Some(entry) = self.source.fetch_entry(collection, id, populate).await? else {
            if prune {
                self.facade
                    .delete_entries(collection, std::slice::from_ref(id))
                    .await?;
            }
            return Ok(());
        };

        let prepared = prepare_entries(&self.registry, collection, vec![entry]);
        log_prepared(&prepared);
        if prepared.is_aborted() {
            return Ok(());
        }

        if prune && !prepared.rejected.is_empty() {
            self.facade
                .delete_entries(collection, &prepared.rejected)
                .await?;
        }
        if prepared.documents.is_empty() {
            return Ok(());
        }

        if prune {
            self.facade
                .update_entries(collection, prepared.documents)
                .await?;
        } else {
            self.facade.add_entries(collection, prepared.documents).await?;
        }
        self.store.append_indexed_collection(collection).await?;
        tracing::debug!(collection, id = %id, "Entry synchronized");
        Ok(())
    }

    async fn report_failure(
        &self,
        event: &MutationEvent,
        ids: &[NaturalId],
        error: Error,
    ) -> Classified {
        let host = self.store.current_host().await;
        let classified = classify(&error, &host);
        tracing::error!(
            collection = %event.collection,
            event = %event.kind,
            ids = ?ids,
            kind = ?classified.kind,
            host = %host,
            "{}",
            classified.message
        );
        classified
    }
}

async fn drain_events(
    dispatcher: Weak<Dispatcher>,
    mut events: mpsc::UnboundedReceiver<MutationEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(dispatcher) = dispatcher.upgrade() else {
            break;
        };
        tokio::spawn(async move {
            dispatcher.handle(event).await;
        });
    }
}
