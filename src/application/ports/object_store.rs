use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};

use super::content_store::{ObjectTag, StorageError, StoreStats};

/// Port for a remote object-storage provider.
///
/// Implementations are selected once at startup from the configured
/// provider name.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Provider name, e.g. "openstack"
    fn provider(&self) -> &'static str;

    /// Upload `content` as `key` into `container`
    async fn upload(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
    ) -> Result<ObjectTag, StorageError>;

    /// Fetch a published object. `Ok(None)` for any non-success status.
    async fn fetch_by_key(&self, key: &str) -> Result<Option<Bytes>, StorageError>;

    /// Backend-reported object count and bytes used
    async fn stat_container(&self, container: &str) -> Result<StoreStats, StorageError>;
}
