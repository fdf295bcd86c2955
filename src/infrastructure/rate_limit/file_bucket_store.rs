use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::{BucketDecision, BucketStore, BucketStoreError};
use crate::domain::entities::{RateBucket, ThrottleLimits};
use crate::infrastructure::rate_limit::BucketFileLock;

/// Default wait for the bucket file lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

type Buckets = BTreeMap<String, RateBucket>;

/// Rate limit buckets in a JSON file shared by every worker process.
///
/// Layout: `{"<hashed identity>": [allowance, last_check, throttle_count]}`.
/// Every check is one read-modify-write under an exclusive lock on
/// `<path>.lock`. Buckets idle for longer than a window are dropped on
/// write.
#[derive(Debug, Clone)]
pub struct FileBucketStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    poll_interval: Duration,
}

impl FileBucketStore {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        Self {
            path,
            lock_path: PathBuf::from(lock_path),
            lock_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn load(&self) -> Result<Buckets, BucketStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Buckets::new()),
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Buckets::new());
        }

        match serde_json::from_str(&raw) {
            Ok(buckets) => Ok(buckets),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Rate limit file is corrupt, starting empty");
                Ok(Buckets::new())
            }
        }
    }

    fn persist(&self, buckets: &Buckets) -> Result<(), BucketStoreError> {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        // the lock is held, so a fixed temp name cannot clash
        std::fs::write(&temp, serde_json::to_vec(buckets)?)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// Blocking read-modify-write of one bucket
    pub fn check_blocking(
        &self,
        identity: &str,
        limits: &ThrottleLimits,
        now: f64,
    ) -> Result<BucketDecision, BucketStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let _lock = BucketFileLock::acquire(&self.lock_path, self.lock_timeout, self.poll_interval)?;

        let mut buckets = self.load()?;
        let before = buckets.len();
        buckets.retain(|id, bucket| id == identity || !bucket.is_expired(limits, now));

        let bucket = buckets
            .entry(identity.to_string())
            .or_insert_with(|| RateBucket::fresh(limits, now));
        let admission = bucket.check(limits, now);
        let bucket = *bucket;

        self.persist(&buckets)?;
        debug!(
            buckets = buckets.len(),
            pruned = before.saturating_sub(buckets.len()),
            "Rate limit file updated"
        );

        Ok(BucketDecision { admission, bucket })
    }
}

#[async_trait]
impl BucketStore for FileBucketStore {
    async fn check(
        &self,
        identity: &str,
        limits: &ThrottleLimits,
        now: f64,
    ) -> Result<BucketDecision, BucketStoreError> {
        let store = self.clone();
        let identity = identity.to_string();
        let limits = *limits;

        tokio::task::spawn_blocking(move || store.check_blocking(&identity, &limits, now))
            .await
            .map_err(|e| BucketStoreError::Internal(format!("rate limit task failed: {}", e)))?
    }
}
