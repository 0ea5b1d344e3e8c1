//! In-process event hub.
//!
//! Holds one subscription per collection and forwards emitted events to it.
//! The `/events` route feeds host webhooks into the hub.

use std::sync::Arc;

use dashmap::DashMap;
use sift_engine::{CollectionName, MutationEvent};

use super::{EventSender, Lifecycle};

#[derive(Debug)]
struct Subscription {
    id: String,
    sender: EventSender,
}

#[derive(Debug)]
pub struct EventHub {
    subscriptions: DashMap<CollectionName, Subscription>,
    live_reload: bool,
}

impl EventHub {
    pub fn new(live_reload: bool) -> Self {
        Self {
            subscriptions: DashMap::new(),
            live_reload,
        }
    }

    pub fn new_shared(live_reload: bool) -> Arc<Self> {
        Arc::new(Self::new(live_reload))
    }

    /// Deliver an event to the subscriber of its collection.
    ///
    /// Returns `false` when nobody listens, in which case the event is dropped.
    pub fn emit(&self, event: MutationEvent) -> bool {
        let Some(subscription) = self.subscriptions.get(&event.collection) else {
            tracing::debug!(
                collection = %event.collection,
                event = %event.kind,
                "No subscriber, event dropped"
            );
            return false;
        };

        match subscription.sender.send(event) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(
                    subscription = %subscription.id,
                    collection = %err.0.collection,
                    "Subscriber is gone, event dropped"
                );
                false
            }
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Lifecycle for EventHub {
    fn subscribe(&self, collection: &str, sender: EventSender) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.subscriptions.insert(
            collection.to_string(),
            Subscription {
                id: id.clone(),
                sender,
            },
        );
        tracing::info!(subscription = %id, collection, "Collection subscribed");
        id
    }

    fn unsubscribe(&self, collection: &str) -> bool {
        match self.subscriptions.remove(collection) {
            Some((_, subscription)) => {
                tracing::info!(
                    subscription = %subscription.id,
                    collection,
                    "Collection unsubscribed"
                );
                true
            }
            None => false,
        }
    }

    fn supports_live_reload(&self) -> bool {
        self.live_reload
    }
}
