//! Administrative operations.
//!
//! Every operation here is synchronous to its caller: enqueued engine tasks
//! are awaited, the whole operation is bounded by the admin timeout, and
//! failures come back as a [`Classified`] error instead of being logged away.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use sift_engine::{
    classify, natural_id, prepare_entries, Classified, CollectionDescriptor, CollectionName,
    Credentials, Error, IndexName, NaturalId, Registry, ResolvedCredentials, Result,
};

use super::{log_prepared, Dispatcher};
use crate::host::{EntrySource, Lifecycle};
use crate::search::{IndexError, IndexReport, SearchEngine, SearchFacade};
use crate::store::ConfigStore;

/// Result of an administrative operation.
pub type AdminResult<T> = std::result::Result<T, Classified>;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Entries fetched from the host per page during a reindex
    pub batch_size: usize,
    pub admin_timeout: Duration,
    pub event_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            admin_timeout: Duration::from_secs(60),
            event_timeout: Duration::from_secs(30),
        }
    }
}

/// State of one collection as shown to administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub collection: CollectionName,
    /// Primary index
    pub index_name: IndexName,
    pub index_names: Vec<IndexName>,
    pub listened: bool,
    pub indexed: bool,
    pub reload_needed: bool,
    pub document_count: u64,
    pub is_indexing: bool,
    pub last_error: Option<IndexError>,
}

impl CollectionReport {
    fn new(descriptor: CollectionDescriptor, index: IndexReport) -> Self {
        Self {
            reload_needed: descriptor.reload_needed(),
            index_name: descriptor
                .index_names
                .first()
                .cloned()
                .unwrap_or_else(|| descriptor.name.clone()),
            collection: descriptor.name,
            index_names: descriptor.index_names,
            listened: descriptor.listened,
            indexed: descriptor.indexed,
            document_count: index.document_count,
            is_indexing: index.is_indexing,
            last_error: index.last_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReloadOutcome {
    /// Subscriptions were rebuilt from the listened set
    Reloaded { subscribed: usize },
    ManualReloadRequired { message: String },
}

pub struct SyncService {
    registry: Arc<Registry>,
    store: Arc<ConfigStore>,
    facade: Arc<SearchFacade>,
    source: Arc<dyn EntrySource>,
    lifecycle: Arc<dyn Lifecycle>,
    dispatcher: Arc<Dispatcher>,
    options: SyncOptions,
}

impl SyncService {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<ConfigStore>,
        engine: Arc<dyn SearchEngine>,
        source: Arc<dyn EntrySource>,
        lifecycle: Arc<dyn Lifecycle>,
        options: SyncOptions,
    ) -> Self {
        let facade = Arc::new(SearchFacade::new(registry.clone(), engine));
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            store.clone(),
            facade.clone(),
            source.clone(),
            lifecycle.clone(),
            options.event_timeout,
        ));
        Self {
            registry,
            store,
            facade,
            source,
            lifecycle,
            dispatcher,
            options,
        }
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Subscribe every listened collection. Returns the number of subscriptions.
    pub async fn start(&self) -> Result<usize> {
        let mut subscribed = 0;
        for name in self.store.get_listened_collections().await? {
            if !self.registry.contains(&name) {
                tracing::warn!(
                    collection = %name,
                    "Listened collection is not configured, skipping"
                );
                continue;
            }
            if self.dispatcher.subscribe(&name) {
                subscribed += 1;
            }
        }
        tracing::info!(subscribed, "Dispatcher started");
        Ok(subscribed)
    }

    pub async fn list_collection_reports(&self) -> AdminResult<Vec<CollectionReport>> {
        let descriptors = self
            .bounded("list collections", self.descriptors())
            .await?;

        let mut reports = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let index = self.index_report(&descriptor.name).await;
            reports.push(CollectionReport::new(descriptor, index));
        }
        Ok(reports)
    }

    /// Start listening to a collection and index every entry of it.
    ///
    /// The subscription is live before the first page is fetched, so writes
    /// made during the reindex reach the index. A failed add of a collection
    /// that was not listened before is rolled back.
    pub async fn add_collection(&self, name: &str) -> AdminResult<CollectionReport> {
        let mut fresh = false;
        let outcome = self
            .bounded("add collection", async {
                self.ensure_registered(name)?;
                fresh = self.store.append_listened_collection(name).await?;
                self.dispatcher.subscribe(name);
                let pushed = self.reindex(name, false).await?;
                tracing::info!(collection = name, pushed, "Collection added");
                Ok(())
            })
            .await;

        if let Err(classified) = outcome {
            if fresh {
                self.abandon(name).await;
            }
            return Err(classified);
        }
        self.report(name).await
    }

    /// Re-push every entry of a listened collection and drop the ones the
    /// filter now rejects.
    pub async fn update_collection(&self, name: &str) -> AdminResult<CollectionReport> {
        self.bounded("update collection", async {
            self.ensure_registered(name)?;
            let listened = self.store.get_listened_collections().await?;
            if !listened.iter().any(|c| c == name) {
                return Err(Error::Configuration(format!(
                    "collection '{name}' is not synchronized, add it first"
                )));
            }
            let pushed = self.reindex(name, true).await?;
            tracing::info!(collection = name, pushed, "Collection updated");
            Ok(())
        })
        .await?;
        self.report(name).await
    }

    /// Stop listening to a collection and remove its documents.
    ///
    /// An index shared with other collections keeps their documents; an index
    /// owned by this collection alone is deleted.
    pub async fn remove_collection(&self, name: &str) -> AdminResult<CollectionReport> {
        self.bounded("remove collection", async {
            if name.trim().is_empty() {
                return Err(Error::Configuration(
                    "collection name must not be empty".to_string(),
                ));
            }

            self.dispatcher.unsubscribe(name);
            for index in self.registry.index_names(name) {
                self.clear_index(&index, name).await?;
            }
            self.store.remove_listened_collection(name).await?;
            self.store.remove_indexed_collection(name).await?;
            tracing::info!(collection = name, "Collection removed");
            Ok(())
        })
        .await?;
        self.report(name).await
    }

    pub async fn get_credentials(&self) -> AdminResult<ResolvedCredentials> {
        self.bounded("get credentials", self.store.get_credentials())
            .await
    }

    pub async fn set_credentials(&self, update: Credentials) -> AdminResult<ResolvedCredentials> {
        let resolved = self
            .bounded("set credentials", self.store.set_credentials(update))
            .await?;
        tracing::info!(host = %resolved.host, "Credentials updated");
        Ok(resolved)
    }

    /// Rebuild every subscription from the listened set.
    pub async fn reload(&self) -> AdminResult<ReloadOutcome> {
        if !self.lifecycle.supports_live_reload() {
            return Ok(ReloadOutcome::ManualReloadRequired {
                message: "Subscriptions cannot be rebuilt while the host is running. Restart the \
                          host to apply collection changes."
                    .to_string(),
            });
        }

        let subscribed = self
            .bounded("reload", async {
                let dropped = self.dispatcher.unsubscribe_all();
                tracing::debug!(dropped, "Subscriptions dropped");
                self.start().await
            })
            .await?;
        Ok(ReloadOutcome::Reloaded { subscribed })
    }

    async fn abandon(&self, name: &str) {
        self.dispatcher.unsubscribe(name);
        if let Err(error) = self.store.remove_listened_collection(name).await {
            tracing::warn!(
                collection = name,
                error = %error,
                "Could not roll back listened collection"
            );
        }
    }

    async fn descriptors(&self) -> Result<Vec<CollectionDescriptor>> {
        let listened = self.store.get_listened_collections().await?;
        let indexed = self.store.get_indexed_collections().await?;
        Ok(self.registry.list_collections(&listened, &indexed))
    }

    async fn report(&self, name: &str) -> AdminResult<CollectionReport> {
        let descriptors = self.bounded("report collection", self.descriptors()).await?;
        let descriptor = descriptors
            .into_iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| CollectionDescriptor {
                name: name.to_string(),
                index_names: self.registry.index_names(name),
                listened: false,
                indexed: false,
            });
        let index = self.index_report(name).await;
        Ok(CollectionReport::new(descriptor, index))
    }

    /// Index state of a collection; an unavailable engine shows up as the
    /// report's last error rather than failing the listing.
    async fn index_report(&self, name: &str) -> IndexReport {
        match self.facade.get_index_report(name).await {
            Ok(report) => report,
            Err(error) => {
                let classified = classify(&error, &self.store.current_host().await);
                tracing::warn!(collection = name, error = %error, "Index report unavailable");
                IndexReport {
                    last_error: Some(IndexError {
                        message: classified.message,
                        at: Utc::now(),
                    }),
                    ..IndexReport::default()
                }
            }
        }
    }

    fn ensure_registered(&self, name: &str) -> Result<()> {
        if self.registry.contains(name) {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "collection '{name}' is not configured"
            )))
        }
    }

    /// Apply settings, then push every entry page by page. Returns the number
    /// of documents pushed.
    async fn reindex(&self, name: &str, prune: bool) -> Result<usize> {
        let Some(config) = self.registry.get(name) else {
            return Ok(0);
        };

        let tasks = self.facade.apply_settings(name, &config.settings).await?;
        self.facade.wait_for_tasks(&tasks).await?;

        let batch_size = self.options.batch_size.max(1);
        let mut start = 0;
        let mut pushed = 0;
        loop {
            let page = self
                .source
                .fetch_entries(name, start, batch_size, config.populate.as_ref())
                .await?;
            let fetched = page.len();

            let prepared = prepare_entries(&self.registry, name, page);
            log_prepared(&prepared);
            if !prepared.is_aborted() {
                if prune && !prepared.rejected.is_empty() {
                    let tasks = self.facade.delete_entries(name, &prepared.rejected).await?;
                    self.facade.wait_for_tasks(&tasks).await?;
                }
                if !prepared.documents.is_empty() {
                    pushed += prepared.documents.len();
                    let tasks = self.facade.add_entries(name, prepared.documents).await?;
                    self.facade.wait_for_tasks(&tasks).await?;
                }
            }

            start += fetched;
            if fetched < batch_size {
                break;
            }
        }

        if pushed > 0 {
            self.store.append_indexed_collection(name).await?;
        }
        Ok(pushed)
    }

    async fn clear_index(&self, index: &str, name: &str) -> Result<()> {
        let shared = self
            .registry
            .collections_sharing_index(index)
            .iter()
            .any(|c| c != name);

        if !shared {
            if let Some(task) = self.facade.delete_index(index).await? {
                self.facade.wait_for_tasks(&[task]).await?;
            }
            return Ok(());
        }

        let ids = self.natural_ids(name).await?;
        if !ids.is_empty() {
            let task = self.facade.delete_entries_in(index, name, &ids).await?;
            self.facade.wait_for_tasks(&[task]).await?;
        }
        Ok(())
    }

    /// Natural ids of every host entry of a collection.
    async fn natural_ids(&self, name: &str) -> Result<Vec<NaturalId>> {
        let id_field = self
            .registry
            .get(name)
            .and_then(|config| config.id_field.as_deref());
        let batch_size = self.options.batch_size.max(1);

        let mut ids = Vec::new();
        let mut start = 0;
        loop {
            let page = self.source.fetch_entries(name, start, batch_size, None).await?;
            let fetched = page.len();
            ids.extend(page.iter().filter_map(|entry| natural_id(entry, id_field)));
            start += fetched;
            if fetched < batch_size {
                break;
            }
        }
        Ok(ids)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        future: impl Future<Output = Result<T>>,
    ) -> AdminResult<T> {
        let limit = self.options.admin_timeout;
        let outcome = tokio::time::timeout(limit, future)
            .await
            .unwrap_or_else(|_| Err(Error::Timeout(limit.as_millis() as u64)));

        match outcome {
            Ok(value) => Ok(value),
            Err(error) => {
                let classified = classify(&error, &self.store.current_host().await);
                tracing::error!(
                    operation,
                    kind = ?classified.kind,
                    error = %error,
                    "Admin operation failed"
                );
                Err(classified)
            }
        }
    }
}
