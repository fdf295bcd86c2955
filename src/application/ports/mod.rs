mod bucket_store;
mod clock;
mod content_store;
mod object_store;

pub use bucket_store::{BucketDecision, BucketStore, BucketStoreError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use content_store::{ContentStore, ObjectTag, StorageError, StoreStats};
pub use object_store::ObjectStore;

#[cfg(test)]
pub use bucket_store::MockBucketStore;
#[cfg(test)]
pub use content_store::MockContentStore;
#[cfg(test)]
pub use object_store::MockObjectStore;
