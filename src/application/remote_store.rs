use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::ports::{ContentStore, ObjectStore, ObjectTag, StorageError, StoreStats};
use crate::application::retry::RetryPolicy;
use crate::domain::value_objects::ContentKey;

/// `ContentStore` over a remote object-storage provider.
///
/// Uploads and container stats go through the retry policy. Reads never
/// fail: any fetch error is logged and reported as absent.
pub struct RemoteStore {
    objects: Arc<dyn ObjectStore>,
    container: String,
    retry: RetryPolicy,
}

impl RemoteStore {
    pub fn new(objects: Arc<dyn ObjectStore>, container: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            objects,
            container: container.into(),
            retry,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

#[async_trait]
impl ContentStore for RemoteStore {
    fn name(&self) -> &'static str {
        self.objects.provider()
    }

    async fn get(&self, key: &ContentKey) -> Result<Option<Bytes>, StorageError> {
        match self.objects.fetch_by_key(key.as_str()).await {
            Ok(found) => {
                debug!(key = %key, found = found.is_some(), "Remote lookup");
                Ok(found)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Remote lookup failed, treating as absent");
                Ok(None)
            }
        }
    }

    async fn put(
        &self,
        key: &ContentKey,
        content: Bytes,
    ) -> Result<Option<ObjectTag>, StorageError> {
        let tag = self
            .retry
            .run("upload", || {
                self.objects
                    .upload(&self.container, key.as_str(), content.clone())
            })
            .await?;

        debug!(key = %key, container = %self.container, etag = %tag, "Uploaded object");
        Ok(Some(tag))
    }

    async fn aggregate_stats(&self, container: &str) -> Result<StoreStats, StorageError> {
        self.retry
            .run("stat_container", || self.objects.stat_container(container))
            .await
    }
}
