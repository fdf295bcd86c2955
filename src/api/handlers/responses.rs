//! Helpers shared by the paste and link handlers

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use bytes::Bytes;

use crate::api::errors::ApiError;
use crate::api::middleware::validate_payload;
use crate::application::dto::ContentRequest;

/// Set to `true` when the request stored new content
pub const CREATED_HEADER: &str = "x-pasted-created";

pub const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

const CACHE_HEADERS: [(HeaderName, &str); 2] = [
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::CACHE_CONTROL, "public, max-age=120"),
];

/// Apply the cache headers every content response carries
pub fn with_cache_headers(headers: &mut HeaderMap) {
    for (name, value) in CACHE_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

/// Decode and validate a `{"content": ...}` body.
///
/// Anything that is not such an object is reported with `missing`.
pub fn parse_content(body: &Bytes, missing: &str) -> Result<ContentRequest, ApiError> {
    let request: ContentRequest =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request(missing))?;
    validate_payload(&request)?;
    Ok(request)
}

/// Turn a service path into an absolute URL.
///
/// Uses the configured public base when present, otherwise the request's
/// `Host` and `X-Forwarded-Proto` headers. Falls back to the bare path.
pub fn absolute_url(public_base: Option<&str>, headers: &HeaderMap, path: &str) -> String {
    if let Some(base) = public_base {
        return format!("{}{}", base, path);
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty());

    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http");
            format!("{}://{}{}", scheme, host, path)
        }
        None => path.to_string(),
    }
}
