use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::health::HealthResponse;
use crate::application::dto::{ContentRequest, StatsResponse};

/// OpenAPI document for the paste service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pasted API",
        version = "1.0.0",
        description = "Content-addressed pastes and short links"
    ),
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::pastes::create_paste_handler,
        crate::api::handlers::pastes::show_paste_handler,
        crate::api::handlers::links::create_link_handler,
        crate::api::handlers::links::follow_link_handler,
        crate::api::handlers::stats::stats_handler,
    ),
    components(schemas(ContentRequest, StatsResponse, HealthResponse)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "pastes", description = "Paste storage"),
        (name = "links", description = "Short links"),
        (name = "stats", description = "Storage statistics")
    )
)]
pub struct ApiDoc;

/// Swagger UI under /info/api
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/info/api").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/api/pastes", "/api/links", "/pastes/{key}", "/l/{key}", "/api/stats", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
