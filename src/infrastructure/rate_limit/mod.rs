mod file_bucket_store;
mod file_lock;

pub use file_bucket_store::{FileBucketStore, DEFAULT_LOCK_TIMEOUT};
pub use file_lock::BucketFileLock;
