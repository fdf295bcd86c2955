use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use reqwest::Url;
use tracing::error;

use crate::api::errors::ApiError;
use crate::api::handlers::responses::{
    absolute_url, parse_content, with_cache_headers, CREATED_HEADER, TEXT_PLAIN_UTF8,
};
use crate::api::router::AppState;
use crate::domain::value_objects::KeyKind;

const MISSING_LINK: &str = "Missing link content";
const INVALID_LINK: &str = "No valid URL provided";

/// Accept only absolute URLs with a scheme and a host
pub fn parse_link(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|_| ApiError::bad_request(INVALID_LINK))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ApiError::bad_request(INVALID_LINK)),
    }
}

/// POST /api/links
/// Shorten a URL to a 16-char key
#[utoipa::path(
    post,
    path = "/api/links",
    tag = "links",
    request_body = crate::application::dto::ContentRequest,
    responses(
        (status = 201, description = "Link stored, body is the short URL", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing content or not a URL"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Storage backend unavailable")
    )
)]
pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_content(&body, MISSING_LINK)?;
    let url = parse_link(&request.content)?;

    // The normalised form is what gets hashed and later sent as Location
    let outcome = state
        .content
        .write(url.as_str().as_bytes(), KeyKind::Short)
        .await?;

    let short_url = absolute_url(state.public_base_url.as_deref(), &headers, &outcome.url);

    let mut response = Response::builder()
        .status(StatusCode::CREATED)
        .header(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)
        .header(header::LOCATION, short_url.as_str())
        .header(CREATED_HEADER, outcome.created.to_string())
        .body(Body::from(short_url))
        .map_err(|e| ApiError::internal_error(format!("Failed to build response: {}", e)))?;
    with_cache_headers(response.headers_mut());

    Ok(response)
}

/// GET /l/{key}
/// Permanent redirect to the stored URL
#[utoipa::path(
    get,
    path = "/l/{key}",
    tag = "links",
    params(
        ("key" = String, Path, description = "16-char hex key")
    ),
    responses(
        (status = 308, description = "Redirect to the stored URL"),
        (status = 400, description = "Malformed key"),
        (status = 404, description = "No link under this key")
    )
)]
pub async fn follow_link_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let content = state.content.read(&key, KeyKind::Short).await?;

    let target = std::str::from_utf8(&content)
        .ok()
        .and_then(|text| HeaderValue::from_str(text.trim()).ok())
        .ok_or_else(|| {
            error!(key = %key, "Stored link is not a valid header value");
            ApiError::internal_error("Stored link is not a valid URL")
        })?;

    let mut response = Response::builder()
        .status(StatusCode::PERMANENT_REDIRECT)
        .header(header::LOCATION, target)
        .header(header::REFERRER_POLICY, "unsafe-url")
        .body(Body::empty())
        .map_err(|e| ApiError::internal_error(format!("Failed to build response: {}", e)))?;
    with_cache_headers(response.headers_mut());

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_accepts_absolute_urls() {
        let url = parse_link("https://example.com/a?b=c").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?b=c");

        let padded = parse_link("  http://example.com  ").unwrap();
        assert_eq!(padded.as_str(), "http://example.com/");
    }

    #[test]
    fn test_parse_link_rejects_non_urls() {
        for raw in ["example.com", "not a url", "mailto:someone@example.com", "/relative/path"] {
            let err = parse_link(raw).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{}", raw);
            assert_eq!(err.message(), INVALID_LINK);
        }
    }
}
