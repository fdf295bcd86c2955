use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::domain::entities::{Admission, RateBucket, ThrottleLimits};

#[derive(Debug, Error)]
pub enum BucketStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {waited:?} waiting for lock {path:?}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of one read-modify-write on a bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketDecision {
    pub admission: Admission,
    pub bucket: RateBucket,
}

/// Port for the persisted, lock-protected rate limit buckets
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BucketStore: Send + Sync {
    /// Atomically load (or create) the bucket for `identity`, run one
    /// admission check at `now` (Unix seconds) and persist the result.
    async fn check(
        &self,
        identity: &str,
        limits: &ThrottleLimits,
        now: f64,
    ) -> Result<BucketDecision, BucketStoreError>;
}
