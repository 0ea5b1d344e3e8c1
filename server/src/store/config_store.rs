//! Credentials and collection sets on top of a [`KvStore`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sift_engine::{CollectionName, Credentials, Error, ResolvedCredentials, Result};
use tokio::sync::{Mutex, RwLock};

use super::KvStore;

const CREDENTIALS_KEY: &str = "credentials";
const LISTENED_KEY: &str = "listened_collections";
const INDEXED_KEY: &str = "indexed_collections";

/// Single source of truth for credentials and collection state.
///
/// Resolved credentials are cached for the lifetime of the process and the
/// cache is dropped on every [`ConfigStore::set_credentials`].
pub struct ConfigStore {
    kv: Arc<dyn KvStore>,
    static_credentials: Credentials,
    cached: RwLock<Option<ResolvedCredentials>>,
    /// Serialises read-modify-write of the collection sets
    sets: Mutex<()>,
}

impl ConfigStore {
    /// `static_credentials` come from configuration and override stored values.
    pub fn new(kv: Arc<dyn KvStore>, static_credentials: Credentials) -> Self {
        Self {
            kv,
            static_credentials,
            cached: RwLock::new(None),
            sets: Mutex::new(()),
        }
    }

    /// Effective credentials, with static configuration taking precedence.
    pub async fn get_credentials(&self) -> Result<ResolvedCredentials> {
        if let Some(resolved) = self.cached.read().await.as_ref() {
            return Ok(resolved.clone());
        }

        // Fill under the write lock so a concurrent update cannot be overwritten.
        let mut cached = self.cached.write().await;
        if let Some(resolved) = cached.as_ref() {
            return Ok(resolved.clone());
        }
        let stored: Credentials = self.read(CREDENTIALS_KEY).await?.unwrap_or_default();
        let resolved = ResolvedCredentials::resolve(&self.static_credentials, &stored);
        *cached = Some(resolved.clone());
        Ok(resolved)
    }

    /// Persist new credentials. Fields owned by static configuration are
    /// silently kept; `None` fields leave the stored value untouched.
    pub async fn set_credentials(&self, update: Credentials) -> Result<ResolvedCredentials> {
        let writable = ResolvedCredentials::writable_update(&self.static_credentials, update);

        let mut cached = self.cached.write().await;
        *cached = None;
        let mut stored: Credentials = self.read(CREDENTIALS_KEY).await?.unwrap_or_default();
        if writable.host.is_some() {
            stored.host = writable.host;
        }
        if writable.api_key.is_some() {
            stored.api_key = writable.api_key;
        }
        self.write(CREDENTIALS_KEY, &stored).await?;

        let resolved = ResolvedCredentials::resolve(&self.static_credentials, &stored);
        *cached = Some(resolved.clone());
        Ok(resolved)
    }

    /// Host currently in effect, or an empty string.
    pub async fn current_host(&self) -> String {
        self.get_credentials()
            .await
            .map(|credentials| credentials.host)
            .unwrap_or_default()
    }

    pub async fn get_listened_collections(&self) -> Result<Vec<CollectionName>> {
        Ok(self.read(LISTENED_KEY).await?.unwrap_or_default())
    }

    /// Add a collection to the listened set. Returns `false` if it was already there.
    pub async fn append_listened_collection(&self, name: &str) -> Result<bool> {
        self.append(LISTENED_KEY, name).await
    }

    pub async fn remove_listened_collection(&self, name: &str) -> Result<bool> {
        self.remove(LISTENED_KEY, name).await
    }

    pub async fn get_indexed_collections(&self) -> Result<Vec<CollectionName>> {
        Ok(self.read(INDEXED_KEY).await?.unwrap_or_default())
    }

    pub async fn append_indexed_collection(&self, name: &str) -> Result<bool> {
        self.append(INDEXED_KEY, name).await
    }

    pub async fn remove_indexed_collection(&self, name: &str) -> Result<bool> {
        self.remove(INDEXED_KEY, name).await
    }

    async fn append(&self, key: &str, name: &str) -> Result<bool> {
        let _guard = self.sets.lock().await;
        let mut names: Vec<CollectionName> = self.read(key).await?.unwrap_or_default();
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        self.write(key, &names).await?;
        Ok(true)
    }

    async fn remove(&self, key: &str, name: &str) -> Result<bool> {
        let _guard = self.sets.lock().await;
        let mut names: Vec<CollectionName> = self.read(key).await?.unwrap_or_default();
        let before = names.len();
        names.retain(|n| n != name);
        if names.len() == before {
            return Ok(false);
        }
        if names.is_empty() {
            self.kv.delete(key).await?;
        } else {
            self.write(key, &names).await?;
        }
        Ok(true)
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Store(format!("corrupt value under '{key}': {e}"))),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::Store(format!("cannot encode '{key}': {e}")))?;
        self.kv.set(key, value).await
    }
}
