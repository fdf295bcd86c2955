use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::ContentKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Remote returned HTTP {status} during {operation}")]
    RemoteStatus { operation: &'static str, status: u16 },

    #[error("Invalid response from remote: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Entity tag reported by the backend for an upload
pub type ObjectTag = String;

/// Aggregate usage of a container or directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub object_count: u64,
    pub total_size_bytes: u64,
}

/// Port for content-addressed storage (local disk or remote container)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Fetch content by key; `None` when absent
    async fn get(&self, key: &ContentKey) -> Result<Option<Bytes>, StorageError>;

    /// Store content under key, returning the backend tag if it reports one
    async fn put(&self, key: &ContentKey, content: Bytes)
        -> Result<Option<ObjectTag>, StorageError>;

    /// Object count and byte usage for `container`
    async fn aggregate_stats(&self, container: &str) -> Result<StoreStats, StorageError>;
}
