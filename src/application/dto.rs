use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::entities::CountSnapshot;

/// Body of `POST /api/pastes` and `POST /api/links`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContentRequest {
    /// Paste text, or the URL to shorten
    #[validate(length(min = 1, message = "Content must not be empty."))]
    #[schema(example = "hello")]
    pub content: String,
}

/// Object count and storage usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub object_count: u64,
    /// Total size in MiB, rounded to 3 decimals
    pub total_size_mb: f64,
}

impl From<&CountSnapshot> for StatsResponse {
    fn from(snapshot: &CountSnapshot) -> Self {
        Self {
            object_count: snapshot.object_count(),
            total_size_mb: snapshot.total_size_mb(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_empty_content_fails_validation() {
        let request = ContentRequest {
            content: String::new(),
        };
        assert!(request.validate().is_err());

        let request = ContentRequest {
            content: "x".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_stats_from_snapshot() {
        let snapshot = CountSnapshot::new(7, 1_572_864, Utc::now(), chrono::Duration::seconds(900));
        let stats = StatsResponse::from(&snapshot);
        assert_eq!(stats.object_count, 7);
        assert_eq!(stats.total_size_mb, 1.5);
    }
}
