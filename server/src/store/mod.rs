//! Durable key/value persistence for credentials and collection state.
//!
//! [`KvStore`] is the host-provided contract; [`ConfigStore`] layers the
//! credential precedence rules and the listened/indexed collection sets on
//! top of it.

mod config_store;
mod memory;

pub use config_store::ConfigStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use sift_engine::Result;

/// Process-wide key/value store scoped to this service's namespace.
///
/// Implementations serialise their own reads and writes. Any failure is
/// reported as [`sift_engine::Error::Store`].
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}
