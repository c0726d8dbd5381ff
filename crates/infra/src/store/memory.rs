use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{Store, StoreError};

/// In-memory store for tests/dev.
///
/// Keys are kept ordered; with time-ordered ids `list` returns records in
/// creation order.
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    inner: RwLock<BTreeMap<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl<K, V> Store<K, V> for InMemoryStore<K, V>
where
    K: Ord + Clone + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    async fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&key) {
            return Err(StoreError::Conflict(format!("key {key} already exists")));
        }
        map.insert(key, value);
        Ok(())
    }

    async fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &K) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreambook_core::UserId;

    #[tokio::test]
    async fn insert_conflicts_but_upsert_overwrites() {
        let store: InMemoryStore<UserId, String> = InMemoryStore::new();
        let id = UserId::new();
        store.insert(id, "first".into()).await.unwrap();
        assert!(matches!(
            store.insert(id, "second".into()).await,
            Err(StoreError::Conflict(_))
        ));
        store.upsert(id, "second".into()).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn list_follows_id_order_and_delete_reports_removal() {
        let store: InMemoryStore<UserId, u32> = InMemoryStore::new();
        let mut ids: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();
        ids.sort();
        for (n, id) in ids.iter().enumerate().rev() {
            store.insert(*id, n as u32).await.unwrap();
        }
        assert_eq!(store.list().await.unwrap(), vec![0, 1, 2]);
        assert!(store.delete(&ids[1]).await.unwrap());
        assert!(!store.delete(&ids[1]).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![0, 2]);
    }
}
