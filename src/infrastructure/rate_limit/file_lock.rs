use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::application::ports::BucketStoreError;

/// Exclusive advisory lock on a `.lock` file, released on drop.
///
/// Acquisition blocks the calling thread, so callers on a runtime must be
/// inside `spawn_blocking`.
#[derive(Debug)]
pub struct BucketFileLock {
    file: File,
    path: PathBuf,
}

impl BucketFileLock {
    /// Poll for the lock every `poll` until `timeout` has passed
    pub fn acquire(path: &Path, timeout: Duration, poll: Duration) -> Result<Self, BucketStoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let contended = fs2::lock_contended_error().kind();
        let started = Instant::now();

        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == contended => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(BucketStoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    std::thread::sleep(poll.min(timeout - waited));
                }
                Err(e) => return Err(BucketStoreError::Io(e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BucketFileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = ?self.path, error = %e, "Failed to release rate limit lock");
        }
    }
}
