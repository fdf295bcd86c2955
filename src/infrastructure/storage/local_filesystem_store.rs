use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{ContentStore, ObjectTag, StorageError, StoreStats};
use crate::domain::value_objects::ContentKey;

const TEMP_PREFIX: &str = ".tmp-";

/// Content store over a flat directory: one file per key, named by the key.
pub struct LocalFilesystemStore {
    root: PathBuf,
    durable_writes: bool,
}

impl LocalFilesystemStore {
    pub fn new(root: PathBuf) -> Self {
        Self::with_durability(root, true)
    }

    pub fn with_durability(root: PathBuf, durable_writes: bool) -> Self {
        Self {
            root,
            durable_writes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the paste directory if absent
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for(&self, key: &ContentKey) -> PathBuf {
        // ContentKey is validated hex, so it can never escape the root
        self.root.join(key.as_str())
    }

    async fn write_temp(&self, temp_path: &Path, content: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(temp_path).await?;
        file.write_all(content).await?;
        if self.durable_writes {
            file.sync_all().await?;
        }
        Ok(())
    }

    async fn sync_root(&self) {
        match File::open(&self.root).await {
            Ok(dir) => {
                if let Err(e) = dir.sync_all().await {
                    warn!("Failed to sync paste directory after rename: {}", e);
                }
            }
            Err(e) => warn!("Failed to open paste directory for sync: {}", e),
        }
    }
}

#[async_trait]
impl ContentStore for LocalFilesystemStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, key: &ContentKey) -> Result<Option<Bytes>, StorageError> {
        match fs::read(self.path_for(key)).await {
            Ok(content) => Ok(Some(Bytes::from(content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(
        &self,
        key: &ContentKey,
        content: Bytes,
    ) -> Result<Option<ObjectTag>, StorageError> {
        fs::create_dir_all(&self.root).await?;

        let final_path = self.path_for(key);
        let temp_path = self
            .root
            .join(format!("{}{}", TEMP_PREFIX, Uuid::new_v4()));

        if let Err(e) = self.write_temp(&temp_path, &content).await {
            warn!("Failed to write temp file {:?}: {}", temp_path, e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if fs::metadata(&final_path).await.is_ok() {
            debug!("Content already on disk (deduplication): {}", key);
            let _ = fs::remove_file(&temp_path).await;
            return Ok(None);
        }

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        if self.durable_writes {
            self.sync_root().await;
        }

        debug!("Wrote {} bytes to {:?}", content.len(), final_path);
        Ok(None)
    }

    async fn aggregate_stats(&self, _container: &str) -> Result<StoreStats, StorageError> {
        let mut stats = StoreStats::default();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(StorageError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                stats.object_count += 1;
                stats.total_size_bytes += metadata.len();
            }
        }

        Ok(stats)
    }
}
