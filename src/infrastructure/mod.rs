pub mod cdn;
pub mod rate_limit;
pub mod storage;
