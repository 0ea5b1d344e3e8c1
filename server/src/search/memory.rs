//! In-memory [`SearchEngine`] recording every write, for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sift_engine::{
    DocumentId, Entry, Error, IndexName, IndexSettings, Result, SEARCH_ID_FIELD,
};

use super::{ApiError, IndexStats, SearchEngine, Task, TaskRef, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Add { index: IndexName, ids: Vec<DocumentId> },
    Delete { index: IndexName, ids: Vec<DocumentId> },
    Settings { index: IndexName },
    DeleteIndex { index: IndexName },
}

#[derive(Default)]
pub struct MemoryEngine {
    calls: Mutex<Vec<EngineCall>>,
    indexes: Mutex<HashMap<IndexName, BTreeMap<DocumentId, Entry>>>,
    failure: Mutex<Option<Error>>,
    failed_tasks: Mutex<HashMap<u64, ApiError>>,
    next_task: AtomicU64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful writes, in call order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make every following write fail with `error`, or succeed again with `None`.
    pub fn fail_with(&self, error: Option<Error>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Report the task as failed when polled.
    pub fn fail_task(&self, task_uid: u64, error: ApiError) {
        self.failed_tasks.lock().unwrap().insert(task_uid, error);
    }

    pub fn documents(&self, index: &str) -> Vec<Entry> {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.indexes.lock().unwrap().contains_key(index)
    }

    fn write(&self, index: &str, call: EngineCall) -> Result<TaskRef> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.calls.lock().unwrap().push(call);
        Ok(TaskRef {
            task_uid: self.next_task.fetch_add(1, Ordering::SeqCst),
            index_uid: Some(index.to_string()),
        })
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn add_documents(&self, index: &str, documents: Vec<Entry>) -> Result<TaskRef> {
        let ids: Vec<DocumentId> = documents
            .iter()
            .filter_map(|doc| doc[SEARCH_ID_FIELD].as_str().map(str::to_string))
            .collect();
        let task = self.write(
            index,
            EngineCall::Add {
                index: index.to_string(),
                ids: ids.clone(),
            },
        )?;

        let mut indexes = self.indexes.lock().unwrap();
        let stored = indexes.entry(index.to_string()).or_default();
        for (id, doc) in ids.into_iter().zip(documents) {
            stored.insert(id, doc);
        }
        Ok(task)
    }

    async fn delete_documents(&self, index: &str, ids: Vec<DocumentId>) -> Result<TaskRef> {
        let task = self.write(
            index,
            EngineCall::Delete {
                index: index.to_string(),
                ids: ids.clone(),
            },
        )?;
        if let Some(stored) = self.indexes.lock().unwrap().get_mut(index) {
            for id in &ids {
                stored.remove(id);
            }
        }
        Ok(task)
    }

    async fn update_settings(&self, index: &str, _settings: &IndexSettings) -> Result<TaskRef> {
        let task = self.write(
            index,
            EngineCall::Settings {
                index: index.to_string(),
            },
        )?;
        self.indexes
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default();
        Ok(task)
    }

    async fn delete_index(&self, index: &str) -> Result<TaskRef> {
        let task = self.write(
            index,
            EngineCall::DeleteIndex {
                index: index.to_string(),
            },
        )?;
        self.indexes.lock().unwrap().remove(index);
        Ok(task)
    }

    async fn index_stats(&self, index: &str) -> Result<Option<IndexStats>> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.indexes.lock().unwrap().get(index).map(|docs| IndexStats {
            number_of_documents: docs.len() as u64,
            is_indexing: false,
        }))
    }

    async fn get_task(&self, task_uid: u64) -> Result<Task> {
        let error = self.failed_tasks.lock().unwrap().get(&task_uid).cloned();
        Ok(Task {
            uid: task_uid,
            status: if error.is_some() {
                TaskStatus::Failed
            } else {
                TaskStatus::Succeeded
            },
            error,
        })
    }
}
