//! In-memory artifact store for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ArtifactKey, ArtifactStore, StoreError, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    entries: Arc<RwLock<HashMap<ArtifactKey, Bytes>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry, replacing any previous value. Test setup only.
    pub async fn seed(&self, key: &ArtifactKey, bytes: impl Into<Bytes>) {
        self.entries.write().await.insert(key.clone(), bytes.into());
    }

    /// Simulates an operator deleting an artifact.
    pub async fn remove(&self, key: &ArtifactKey) {
        self.entries.write().await.remove(key);
    }

    pub async fn text(&self, key: &ArtifactKey) -> Option<String> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn exists(&self, key: &ArtifactKey) -> StoreResult<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn get(&self, key: &ArtifactKey) -> StoreResult<Bytes> {
        self.entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn put(&self, key: &ArtifactKey, bytes: Bytes) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.clone()));
        }
        entries.insert(key.clone(), bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_is_create_or_fail() {
        let store = MemoryArtifactStore::new();
        let key = ArtifactKey::from("/work/p/questions.json");

        store.put(&key, Bytes::from_static(b"a")).await.unwrap();
        let err = store.put(&key, Bytes::from_static(b"b")).await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.text(&key).await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_remove_resets_presence() {
        let store = MemoryArtifactStore::new();
        let key = ArtifactKey::from("/work/p/questions.json");

        store.seed(&key, "x").await;
        assert!(store.exists(&key).await.unwrap());
        store.remove(&key).await;
        assert!(!store.exists(&key).await.unwrap());
    }
}
