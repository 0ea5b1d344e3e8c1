//! Key/value store backed by the `sift_store` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sift_engine::{Error, Result};
use sqlx::{PgPool, Row};

use crate::store::KvStore;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "sift";

/// A stored key/value row from the database.
#[derive(Debug)]
pub struct StoredValue {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredValue {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(StoredValue {
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// [`KvStore`] persisting into PostgreSQL.
///
/// Every key lives under a namespace so several services can share a table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    namespace: String,
}

impl PgStore {
    pub fn new(pool: PgPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    /// Fetch a row including its modification time.
    pub async fn get_row(&self, key: &str) -> Result<Option<StoredValue>> {
        sqlx::query_as::<_, StoredValue>(
            r#"
            SELECT key, value, updated_at
            FROM sift_store
            WHERE namespace = $1 AND key = $2
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }
}

#[async_trait]
impl KvStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row = self.get_row(key).await?;
        if let Some(row) = &row {
            tracing::trace!(key = %row.key, updated_at = %row.updated_at, "Store read");
        }
        Ok(row.map(|row| row.value))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sift_store (namespace, key, value, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (namespace, key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(&value)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM sift_store WHERE namespace = $1 AND key = $2"#)
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}

fn store_error(e: sqlx::Error) -> Error {
    tracing::error!("Database error: {:?}", e);
    Error::Store(e.to_string())
}
