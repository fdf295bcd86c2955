use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Cached aggregate object count and byte usage for one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSnapshot {
    object_count: u64,
    total_size_bytes: u64,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CountSnapshot {
    pub fn new(
        object_count: u64,
        total_size_bytes: u64,
        fetched_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            object_count,
            total_size_bytes,
            fetched_at,
            expires_at: fetched_at + ttl,
        }
    }

    /// Still usable at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Total size in MiB, rounded to 3 decimal places
    pub fn total_size_mb(&self) -> f64 {
        let mb = self.total_size_bytes as f64 / 1024.0 / 1024.0;
        (mb * 1000.0).round() / 1000.0
    }

    // Getters
    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
