pub mod builder;
pub mod content_service;
pub mod count_cache;
pub mod dto;
pub mod errors;
pub mod ports;
pub mod rate_limiter;
pub mod remote_store;
pub mod retry;
pub mod urls;
