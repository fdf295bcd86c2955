use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Cannot truncate key to {length} characters (expected 16 or 40)")]
    InvalidTruncation { length: usize },
}

impl DomainError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
