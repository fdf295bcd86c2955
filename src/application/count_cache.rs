use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::application::ports::{Clock, ContentStore, StorageError};
use crate::domain::entities::CountSnapshot;

/// Default lifetime of a cached count
pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(900);

type Slot = Arc<Mutex<Option<CountSnapshot>>>;

/// Short-lived cache in front of `ContentStore::aggregate_stats`.
///
/// Each container has its own async mutex. Concurrent callers queue on it,
/// so an expired entry is refreshed by exactly one of them and the rest
/// read the new snapshot.
pub struct CountCache {
    source: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: DashMap<String, Slot>,
}

impl CountCache {
    pub fn new(source: Arc<dyn ContentStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot for `container`, refreshed from the source when stale
    pub async fn get(&self, container: &str) -> Result<CountSnapshot, StorageError> {
        let slot = Arc::clone(
            &*self
                .entries
                .entry(container.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        );

        let mut cached = slot.lock().await;
        let now = self.clock.now();

        if let Some(snapshot) = cached.as_ref() {
            if snapshot.is_fresh(now) {
                debug!(container, "Count cache hit");
                return Ok(snapshot.clone());
            }
        }

        let stats = self.source.aggregate_stats(container).await?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| StorageError::Internal(format!("invalid cache ttl: {}", e)))?;
        let snapshot = CountSnapshot::new(stats.object_count, stats.total_size_bytes, now, ttl);

        info!(
            container,
            source = self.source.name(),
            object_count = snapshot.object_count(),
            total_size_bytes = snapshot.total_size_bytes(),
            "Refreshed object count"
        );

        *cached = Some(snapshot.clone());
        Ok(snapshot)
    }
}
