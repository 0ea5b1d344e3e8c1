//! Search engine contract and wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_engine::{DocumentId, Entry, Error, IndexName, IndexSettings, Result};

/// Reference to an asynchronous task enqueued by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub task_uid: u64,
    #[serde(default)]
    pub index_uid: Option<IndexName>,
}

/// Lifecycle of an engine task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

/// Error body returned by the engine, both for rejected requests and failed tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl From<ApiError> for Error {
    fn from(api: ApiError) -> Self {
        Error::EngineValidation {
            message: api.message,
            code: api.code,
            link: api.link,
        }
    }
}

/// Status of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub uid: u64,
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Index statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub number_of_documents: u64,
    pub is_indexing: bool,
}

/// Operations the sync engine needs from a search engine.
///
/// Document writes are upserts keyed on `_search_id`. Every write returns a
/// [`TaskRef`]; callers that need completion poll [`SearchEngine::get_task`].
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn add_documents(&self, index: &str, documents: Vec<Entry>) -> Result<TaskRef>;

    async fn delete_documents(&self, index: &str, ids: Vec<DocumentId>) -> Result<TaskRef>;

    async fn update_settings(&self, index: &str, settings: &IndexSettings) -> Result<TaskRef>;

    async fn delete_index(&self, index: &str) -> Result<TaskRef>;

    /// `None` when the index does not exist.
    async fn index_stats(&self, index: &str) -> Result<Option<IndexStats>>;

    async fn get_task(&self, task_uid: u64) -> Result<Task>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_wire_format() {
        let task: Task = serde_json::from_value(json!({
            "uid": 12,
            "indexUid": "products",
            "status": "failed",
            "type": "documentAdditionOrUpdate",
            "error": {
                "message": "Document identifier `a b` is invalid.",
                "code": "invalid_document_id",
                "type": "invalid_request",
                "link": "https://docs.meilisearch.com/errors#invalid_document_id"
            }
        }))
        .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.status.is_finished());
        let err: Error = task.error.unwrap().into();
        assert!(matches!(
            err,
            Error::EngineValidation { code: Some(ref code), .. } if code == "invalid_document_id"
        ));
    }

    #[test]
    fn enqueued_task_wire_format() {
        let task: TaskRef = serde_json::from_value(json!({
            "taskUid": 3,
            "indexUid": "my_restaurant",
            "status": "enqueued",
            "enqueuedAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(task.task_uid, 3);
        assert_eq!(task.index_uid.as_deref(), Some("my_restaurant"));
    }

    #[test]
    fn stats_wire_format() {
        let stats: IndexStats = serde_json::from_value(json!({
            "numberOfDocuments": 42,
            "isIndexing": true,
            "fieldDistribution": {"title": 42}
        }))
        .unwrap();
        assert_eq!(stats.number_of_documents, 42);
        assert!(stats.is_indexing);
    }
}
