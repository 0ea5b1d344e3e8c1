//! [`EntrySource`] over the host's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use sift_engine::{Entry, Error, Result};

use super::EntrySource;

/// Reads entries from `GET {base}/{collection}/{id}` and
/// `GET {base}/{collection}?start=&limit=`.
///
/// Responses may be wrapped in a `{"data": ...}` envelope.
pub struct HttpEntrySource {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpEntrySource {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str, populate: Option<&Value>) -> RequestBuilder {
        let mut request = self.http.get(format!("{}/{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(rule) = populate {
            request = request.query(&[("populate", rule.to_string())]);
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| Error::Host(format!("request to {} failed: {e}", self.base_url)))
    }
}

#[async_trait]
impl EntrySource for HttpEntrySource {
    async fn fetch_entry(
        &self,
        collection: &str,
        id: &str,
        populate: Option<&Value>,
    ) -> Result<Option<Entry>> {
        let response = self
            .send(self.get(&format!("{collection}/{id}"), populate))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        match unwrap_data(read_body(response).await?) {
            Value::Null => Ok(None),
            entry => Ok(Some(entry)),
        }
    }

    async fn fetch_entries(
        &self,
        collection: &str,
        start: usize,
        limit: usize,
        populate: Option<&Value>,
    ) -> Result<Vec<Entry>> {
        let request = self
            .get(collection, populate)
            .query(&[("start", start), ("limit", limit)]);
        let response = self.send(request).await?;

        match unwrap_data(read_body(response).await?) {
            Value::Array(entries) => Ok(entries),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::Host(format!(
                "expected a list of '{collection}' entries, got {other}"
            ))),
        }
    }
}

async fn read_body(response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Host(format!("host answered {status}")));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| Error::Host(format!("invalid host response: {e}")))
}

fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
