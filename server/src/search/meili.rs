//! HTTP client for a Meilisearch-compatible engine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sift_engine::{
    DocumentId, Entry, Error, IndexSettings, ResolvedCredentials, Result, SEARCH_ID_FIELD,
};

use super::{ApiError, IndexStats, SearchEngine, Task, TaskRef};
use crate::store::ConfigStore;

/// [`SearchEngine`] speaking the Meilisearch REST API.
///
/// Credentials are read from the [`ConfigStore`] on every request, so a
/// credential update takes effect without rebuilding the client.
pub struct MeiliClient {
    http: reqwest::Client,
    credentials: Arc<ConfigStore>,
}

impl MeiliClient {
    /// `timeout` bounds each individual request.
    pub fn new(credentials: Arc<ConfigStore>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, credentials })
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response> {
        let credentials = self.credentials.get_credentials().await?;
        if !credentials.has_host() {
            return Err(Error::Configuration(
                "search engine host is not configured".to_string(),
            ));
        }

        let url = format!("{}{}", credentials.host.trim_end_matches('/'), path);
        let mut request = self.http.request(method.clone(), &url);
        if !credentials.api_key.is_empty() {
            request = request.bearer_auth(&credentials.api_key);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!(%method, path, "Search engine request");
        request
            .send()
            .await
            .map_err(|e| transport_error(&credentials, e))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let response = self.send(method, path, body).await?;
        parse(response).await
    }
}

#[async_trait]
impl SearchEngine for MeiliClient {
    async fn add_documents(&self, index: &str, documents: Vec<Entry>) -> Result<TaskRef> {
        let path = format!("/indexes/{index}/documents?primaryKey={SEARCH_ID_FIELD}");
        self.call(Method::POST, &path, Some(Value::Array(documents))).await
    }

    async fn delete_documents(&self, index: &str, ids: Vec<DocumentId>) -> Result<TaskRef> {
        let path = format!("/indexes/{index}/documents/delete-batch");
        let ids: Vec<Value> = ids.into_iter().map(Value::String).collect();
        self.call(Method::POST, &path, Some(Value::Array(ids))).await
    }

    async fn update_settings(&self, index: &str, settings: &IndexSettings) -> Result<TaskRef> {
        let body = serde_json::to_value(settings)
            .map_err(|e| Error::Configuration(format!("invalid index settings: {e}")))?;
        let path = format!("/indexes/{index}/settings");
        self.call(Method::PATCH, &path, Some(body)).await
    }

    async fn delete_index(&self, index: &str) -> Result<TaskRef> {
        self.call(Method::DELETE, &format!("/indexes/{index}"), None).await
    }

    async fn index_stats(&self, index: &str) -> Result<Option<IndexStats>> {
        let response = self
            .send(Method::GET, &format!("/indexes/{index}/stats"), None)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse(response).await.map(Some)
    }

    async fn get_task(&self, task_uid: u64) -> Result<Task> {
        self.call(Method::GET, &format!("/tasks/{task_uid}"), None).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| Error::EngineValidation {
            message: format!("unexpected response from search engine: {e}"),
            code: None,
            link: None,
        });
    }

    let api = response.json::<ApiError>().await.unwrap_or_else(|_| ApiError {
        message: format!("search engine answered {status}"),
        ..ApiError::default()
    });
    Err(api.into())
}

fn transport_error(credentials: &ResolvedCredentials, e: reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };
    Error::EngineUnreachable {
        host: credentials.host.clone(),
        reason,
    }
}
