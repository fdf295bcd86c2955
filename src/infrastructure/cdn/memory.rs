//! In-process object store for development and tests

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{ObjectStore, ObjectTag, StorageError, StoreStats};

struct StoredObject {
    container: String,
    content: Bytes,
}

/// Thread-safe via `DashMap`. Not persistent, data is lost on drop.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<String, StoredObject>,
    stat_calls: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all containers
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// How many times `stat_container` has been called
    pub fn stat_calls(&self) -> u64 {
        self.stat_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn provider(&self) -> &'static str {
        "memory"
    }

    async fn upload(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
    ) -> Result<ObjectTag, StorageError> {
        let etag = hex::encode(Sha256::digest(&content));
        self.objects.insert(
            key.to_string(),
            StoredObject {
                container: container.to_string(),
                content,
            },
        );
        Ok(etag)
    }

    async fn fetch_by_key(&self, key: &str) -> Result<Option<Bytes>, StorageError> {
        Ok(self.objects.get(key).map(|o| o.content.clone()))
    }

    async fn stat_container(&self, container: &str) -> Result<StoreStats, StorageError> {
        self.stat_calls.fetch_add(1, Ordering::Relaxed);

        let mut stats = StoreStats::default();
        for object in self.objects.iter().filter(|o| o.container == container) {
            stats.object_count += 1;
            stats.total_size_bytes += object.content.len() as u64;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let store = InMemoryObjectStore::new();
        let etag = store
            .upload("pasted", "abc", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(
            etag,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            store.fetch_by_key("abc").await.unwrap(),
            Some(Bytes::from_static(b"hello"))
        );
        assert_eq!(store.fetch_by_key("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_are_per_container() {
        let store = InMemoryObjectStore::new();
        store.upload("a", "k1", Bytes::from_static(b"12345")).await.unwrap();
        store.upload("a", "k2", Bytes::from_static(b"123")).await.unwrap();
        store.upload("b", "k3", Bytes::from_static(b"1")).await.unwrap();

        let stats = store.stat_container("a").await.unwrap();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.total_size_bytes, 8);
        assert_eq!(store.stat_container("c").await.unwrap(), StoreStats::default());
        assert_eq!(store.stat_calls(), 2);
        assert_eq!(store.len(), 3);
    }
}
