use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::application::errors::{ContentError, RateLimitError};

/// API error response.
///
/// The body is `{"error": message}` with any payload fields merged in.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    payload: Option<Value>,
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: None,
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(self.message));

        match self.payload {
            Some(Value::Object(fields)) => {
                for (name, value) in fields {
                    body.entry(name).or_insert(value);
                }
            }
            Some(other) => {
                body.insert("details".to_string(), other);
            }
            None => {}
        }

        let mut response = (self.status, Json(Value::Object(body))).into_response();
        if let Some(seconds) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::InvalidKey(e) => ApiError::bad_request(e.to_string()),
            ContentError::NotFound(key) => ApiError::not_found(format!("Not found: {}", key)),
            ContentError::BadRequest { message, payload } => {
                let api_error = ApiError::bad_request(message);
                match payload {
                    Some(payload) => api_error.with_payload(payload),
                    None => api_error,
                }
            }
            ContentError::Storage(e) => {
                error!(error = %e, "Storage backend failed");
                ApiError::new(StatusCode::BAD_GATEWAY, "Storage backend unavailable")
            }
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        let message = err.to_string();
        match err {
            RateLimitError::Exceeded { rate, per_secs } => {
                let mut api_error = ApiError::new(StatusCode::TOO_MANY_REQUESTS, message)
                    .with_payload(json!({ "rate": rate, "per": per_secs }));
                api_error.retry_after = Some(per_secs);
                api_error
            }
            RateLimitError::Store(e) => {
                error!(error = %e, "Rate limit store failed");
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Rate limiting unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BucketStoreError, StorageError};
    use crate::domain::errors::DomainError;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_payload_is_merged() {
        let err: ApiError = ContentError::bad_request_with(
            "Content too large.",
            json!({ "max_bytes": 10, "received_bytes": 11 }),
        )
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "Content too large.");
        assert_eq!(body["max_bytes"], 10);
        assert_eq!(body["received_bytes"], 11);
    }

    #[tokio::test]
    async fn test_payload_cannot_override_error() {
        let err = ApiError::bad_request("real").with_payload(json!({ "error": "fake" }));
        let body = body_json(err.into_response()).await;
        assert_eq!(body["error"], "real");
    }

    #[test]
    fn test_content_error_statuses() {
        let invalid: ApiError = ContentError::from(DomainError::invalid_key("zz", "bad")).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = ContentError::NotFound("abc".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let storage: ApiError =
            ContentError::from(StorageError::Timeout("upload".to_string())).into();
        assert_eq!(storage.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(storage.message(), "Storage backend unavailable");
    }

    #[tokio::test]
    async fn test_rate_limit_exceeded_response() {
        let err: ApiError = RateLimitError::Exceeded {
            rate: 10.0,
            per_secs: 10,
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "10");

        let body = body_json(response).await;
        assert_eq!(body["rate"], 10.0);
        assert_eq!(body["per"], 10);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Rate limit exceeded."));
    }

    #[test]
    fn test_rate_limit_store_error_is_unavailable() {
        let err: ApiError = RateLimitError::from(BucketStoreError::Internal("boom".to_string())).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
