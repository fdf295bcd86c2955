use axum::{extract::State, Json};

use crate::api::errors::ApiError;
use crate::api::router::AppState;
use crate::application::dto::StatsResponse;

/// GET /api/stats
/// Object count and total size of the counted container
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Current counts", body = StatsResponse),
        (status = 502, description = "Storage backend unavailable")
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let snapshot = state.content.count().await?;
    Ok(Json(StatsResponse::from(&snapshot)))
}
