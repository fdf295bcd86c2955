use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use bytes::Bytes;

use crate::api::errors::ApiError;
use crate::api::handlers::responses::{
    absolute_url, parse_content, with_cache_headers, CREATED_HEADER, TEXT_PLAIN_UTF8,
};
use crate::api::router::AppState;
use crate::domain::value_objects::KeyKind;

const MISSING_PASTE: &str = "Missing paste content.";
const RAW_SUFFIX: &str = ".raw";

/// POST /api/pastes
/// Store a paste and answer with its absolute raw URL
#[utoipa::path(
    post,
    path = "/api/pastes",
    tag = "pastes",
    request_body = crate::application::dto::ContentRequest,
    responses(
        (status = 201, description = "Paste stored, body is the raw URL", body = String, content_type = "text/plain"),
        (status = 400, description = "Missing, empty or oversized content"),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Storage backend unavailable")
    )
)]
pub async fn create_paste_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_content(&body, MISSING_PASTE)?;

    let outcome = state
        .content
        .write(request.content.as_bytes(), KeyKind::Full)
        .await?;

    let raw_url = absolute_url(
        state.public_base_url.as_deref(),
        &headers,
        &state.content.urls().raw_url(&outcome.key),
    );

    let mut response = Response::builder()
        .status(StatusCode::CREATED)
        .header(header::CONTENT_TYPE, TEXT_PLAIN_UTF8)
        .header(header::LOCATION, raw_url.as_str())
        .header(CREATED_HEADER, outcome.created.to_string())
        .body(Body::from(raw_url))
        .map_err(|e| ApiError::internal_error(format!("Failed to build response: {}", e)))?;
    with_cache_headers(response.headers_mut());

    Ok(response)
}

/// GET /pastes/{key} and /pastes/{key}.raw
/// Raw paste content
#[utoipa::path(
    get,
    path = "/pastes/{key}",
    tag = "pastes",
    params(
        ("key" = String, Path, description = "40-char hex key, optionally suffixed with .raw")
    ),
    responses(
        (status = 200, description = "Paste content", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed key"),
        (status = 404, description = "No paste under this key")
    )
)]
pub async fn show_paste_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let (key, raw) = match key.strip_suffix(RAW_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (key.as_str(), false),
    };

    let content = state.content.read(key, KeyKind::Full).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, TEXT_PLAIN_UTF8);

    if raw {
        let page = absolute_url(
            state.public_base_url.as_deref(),
            &headers,
            &format!("/pastes/{}", key),
        );
        builder = builder.header(header::LOCATION, page);
    }

    let mut response = builder
        .body(Body::from(content))
        .map_err(|e| ApiError::internal_error(format!("Failed to build response: {}", e)))?;
    with_cache_headers(response.headers_mut());

    Ok(response)
}
