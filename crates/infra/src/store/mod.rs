//! Keyed document storage.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PostgresJsonStore, ensure_schema};

/// Storage failure.
///
/// These are infrastructure errors; domain rule violations never surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Insert of a key that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Async key/value store for one collection of records.
#[async_trait]
pub trait Store<K, V>: Send + Sync {
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Insert a new record; fails with [`StoreError::Conflict`] if `key` exists.
    async fn insert(&self, key: K, value: V) -> Result<(), StoreError>;

    async fn upsert(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, key: &K) -> Result<bool, StoreError>;

    /// All records, ordered by key.
    async fn list(&self) -> Result<Vec<V>, StoreError>;
}

pub type DynStore<K, V> = Arc<dyn Store<K, V>>;

#[async_trait]
impl<K, V, S> Store<K, V> for Arc<S>
where
    K: Send + Sync + 'static,
    V: Send + 'static,
    S: Store<K, V> + ?Sized,
{
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(key).await
    }

    async fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).insert(key, value).await
    }

    async fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(key, value).await
    }

    async fn delete(&self, key: &K) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    async fn list(&self) -> Result<Vec<V>, StoreError> {
        (**self).list().await
    }
}
