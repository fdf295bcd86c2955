mod count_snapshot;
mod rate_bucket;

pub use count_snapshot::CountSnapshot;
pub use rate_bucket::{Admission, RateBucket, ThrottleLimits};
