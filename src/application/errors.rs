//! Error types returned by the application services

use thiserror::Error;

use crate::application::ports::{BucketStoreError, StorageError};
use crate::domain::errors::DomainError;

/// Errors from writing, reading and counting content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] DomainError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    BadRequest {
        message: String,
        payload: Option<serde_json::Value>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ContentError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ContentError::BadRequest {
            message: message.into(),
            payload: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, payload: serde_json::Value) -> Self {
        ContentError::BadRequest {
            message: message.into(),
            payload: Some(payload),
        }
    }
}

/// Errors from an admission check
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded. Rate is [{rate}]. Retry after {per_secs} seconds.")]
    Exceeded { rate: f64, per_secs: u64 },

    #[error("Rate limit store unavailable: {0}")]
    Store(#[from] BucketStoreError),
}
