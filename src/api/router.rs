use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

use crate::api::handlers::{
    create_link_handler, create_paste_handler, follow_link_handler, health_handler,
    show_paste_handler, stats_handler,
};
use crate::api::middleware::rate_limit_middleware;
use crate::api::openapi::swagger_ui;
use crate::application::content_service::ContentService;
use crate::application::rate_limiter::RateLimiter;

/// Room for JSON framing and escapes around the largest accepted paste
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state container
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    pub limiter: Arc<RateLimiter>,
    /// Base for absolute URLs, without a trailing slash
    pub public_base_url: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("throttle", &self.limiter.policy())
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .content
        .max_content_bytes()
        .saturating_mul(2)
        .saturating_add(BODY_OVERHEAD_BYTES);

    // Only writes are rate limited
    let writes = Router::new()
        .route(
            "/api/pastes",
            post(create_paste_handler).with_state(state.clone()),
        )
        .route(
            "/api/links",
            post(create_link_handler).with_state(state.clone()),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state.limiter),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/pastes/{key}",
            get(show_paste_handler).with_state(state.clone()),
        )
        .route("/l/{key}", get(follow_link_handler).with_state(state.clone()))
        .route("/api/stats", get(stats_handler).with_state(state))
        .merge(writes)
        .merge(swagger_ui())
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}
