//! Collection-level facade over a [`SearchEngine`].
//!
//! Every operation resolves the collection's target indexes through the
//! [`Registry`] first. Entries headed for the same index are sent in one
//! call; a failure on one index does not stop the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use sift_engine::{
    make_document_id, CollectionName, Entry, Error, IndexName, IndexSettings, NaturalId,
    Registry, Result,
};

use super::{SearchEngine, TaskRef, TaskStatus};

/// Interval between two task status polls.
const TASK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Most recent failure seen on an index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexError {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Index-level state of a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    /// Documents across every index the collection writes to
    pub document_count: u64,
    pub is_indexing: bool,
    pub last_error: Option<IndexError>,
}

/// Entries of several collections gathered from one triggering event.
pub type Batch = Vec<(CollectionName, Vec<Entry>)>;

pub struct SearchFacade {
    registry: Arc<Registry>,
    engine: Arc<dyn SearchEngine>,
    last_errors: DashMap<IndexName, IndexError>,
}

impl SearchFacade {
    pub fn new(registry: Arc<Registry>, engine: Arc<dyn SearchEngine>) -> Self {
        Self {
            registry,
            engine,
            last_errors: DashMap::new(),
        }
    }

    /// Add (upsert) already prepared documents of one collection.
    pub async fn add_entries(
        &self,
        collection: &str,
        documents: Vec<Entry>,
    ) -> Result<Vec<TaskRef>> {
        self.add_batch(vec![(collection.to_string(), documents)])
            .await
    }

    /// Documents are upserted on `_search_id`, so an update is a re-add.
    pub async fn update_entries(
        &self,
        collection: &str,
        documents: Vec<Entry>,
    ) -> Result<Vec<TaskRef>> {
        self.add_entries(collection, documents).await
    }

    /// Add documents of one event, grouped into a single call per index.
    ///
    /// Element order within an index follows the batch order.
    pub async fn add_batch(&self, batch: Batch) -> Result<Vec<TaskRef>> {
        let mut per_index: Vec<(IndexName, Vec<Entry>)> = Vec::new();
        for (collection, documents) in batch {
            if documents.is_empty() {
                continue;
            }
            for index in self.registry.index_names(&collection) {
                match per_index.iter_mut().find(|(name, _)| *name == index) {
                    Some((_, pending)) => pending.extend(documents.iter().cloned()),
                    None => per_index.push((index, documents.clone())),
                }
            }
        }

        let calls = per_index.into_iter().map(|(index, documents)| async move {
            tracing::debug!(index = %index, count = documents.len(), "Adding documents");
            let result = self.engine.add_documents(&index, documents).await;
            (index, result)
        });
        self.fold_results(join_all(calls).await)
    }

    /// Delete entries of a collection by natural id from all its indexes.
    pub async fn delete_entries(
        &self,
        collection: &str,
        ids: &[NaturalId],
    ) -> Result<Vec<TaskRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let calls = self
            .registry
            .index_names(collection)
            .into_iter()
            .map(|index| async move {
                let result = self.delete_entries_in(&index, collection, ids).await;
                (index, result)
            });
        self.fold_results(join_all(calls).await)
    }

    /// Delete entries of a collection from one index only.
    pub async fn delete_entries_in(
        &self,
        index: &str,
        collection: &str,
        ids: &[NaturalId],
    ) -> Result<TaskRef> {
        let document_ids = ids
            .iter()
            .map(|id| make_document_id(collection, id))
            .collect::<Vec<_>>();
        tracing::debug!(index, count = document_ids.len(), "Deleting documents");
        self.engine.delete_documents(index, document_ids).await
    }

    /// Apply index settings to every index of a collection.
    pub async fn apply_settings(
        &self,
        collection: &str,
        settings: &IndexSettings,
    ) -> Result<Vec<TaskRef>> {
        if settings.is_empty() {
            return Ok(Vec::new());
        }

        let calls = self
            .registry
            .index_names(collection)
            .into_iter()
            .map(|index| async move {
                let result = self.engine.update_settings(&index, settings).await;
                (index, result)
            });
        self.fold_results(join_all(calls).await)
    }

    /// Delete an index. Missing indexes are not an error.
    pub async fn delete_index(&self, index: &str) -> Result<Option<TaskRef>> {
        if self.engine.index_stats(index).await?.is_none() {
            return Ok(None);
        }
        let task = self.engine.delete_index(index).await?;
        self.last_errors.remove(index);
        Ok(Some(task))
    }

    /// Document count and indexing state over all indexes of a collection.
    pub async fn get_index_report(&self, collection: &str) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        for index in self.registry.index_names(collection) {
            if let Some(stats) = self.engine.index_stats(&index).await? {
                report.document_count += stats.number_of_documents;
                report.is_indexing |= stats.is_indexing;
            }
            if let Some(error) = self.last_errors.get(&index) {
                let newer = report
                    .last_error
                    .as_ref()
                    .map_or(true, |current| current.at < error.at);
                if newer {
                    report.last_error = Some(error.clone());
                }
            }
        }
        Ok(report)
    }

    /// Wait for tasks to finish. A failed task becomes an
    /// [`Error::EngineValidation`]; callers bound the wait with a timeout.
    pub async fn wait_for_tasks(&self, tasks: &[TaskRef]) -> Result<()> {
        for task_ref in tasks {
            let task = loop {
                let task = self.engine.get_task(task_ref.task_uid).await?;
                if task.status.is_finished() {
                    break task;
                }
                tokio::time::sleep(TASK_POLL_INTERVAL).await;
            };
            if task.status == TaskStatus::Succeeded {
                continue;
            }

            let error: Error = match task.error {
                Some(api) => api.into(),
                None => Error::EngineValidation {
                    message: format!("task {} was {:?}", task.uid, task.status),
                    code: None,
                    link: None,
                },
            };
            if let Some(index) = &task_ref.index_uid {
                self.record_failure(index, &error);
            }
            return Err(error);
        }
        Ok(())
    }

    /// Fold per-index results: keep every task, remember failures, return the first error.
    fn fold_results(&self, results: Vec<(IndexName, Result<TaskRef>)>) -> Result<Vec<TaskRef>> {
        let mut tasks = Vec::with_capacity(results.len());
        let mut first_error = None;

        for (index, result) in results {
            match result {
                Ok(mut task) => {
                    self.last_errors.remove(&index);
                    task.index_uid.get_or_insert(index);
                    tasks.push(task);
                }
                Err(error) => {
                    self.record_failure(&index, &error);
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(tasks),
        }
    }

    fn record_failure(&self, index: &str, error: &Error) {
        tracing::warn!(index, error = %error, "Search engine operation failed");
        self.last_errors.insert(
            index.to_string(),
            IndexError {
                message: error.to_string(),
                at: Utc::now(),
            },
        );
    }
}
