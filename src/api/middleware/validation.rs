use serde::Serialize;
use serde_json::json;
use validator::Validate;

use crate::api::errors::ApiError;

/// Field error details
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validate a request body, turning failures into a 400 carrying `field_errors`.
///
/// The first field message becomes the `error` text.
pub fn validate_payload<T>(payload: &T) -> Result<(), ApiError>
where
    T: Validate,
{
    payload.validate().map_err(|validation_errors| {
        let mut field_errors: Vec<FieldError> = validation_errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|cow| cow.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        let message = field_errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Validation failed".to_string());

        ApiError::bad_request(message).with_payload(json!({ "field_errors": field_errors }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::ContentRequest;
    use axum::http::StatusCode;

    #[test]
    fn test_valid_payload_passes() {
        let request = ContentRequest {
            content: "hello".to_string(),
        };
        assert!(validate_payload(&request).is_ok());
    }

    #[test]
    fn test_empty_content_is_bad_request() {
        let request = ContentRequest {
            content: String::new(),
        };

        let err = validate_payload(&request).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Content must not be empty.");
    }
}
