//! Generated OpenAPI document served at `/openapi/v1.json`.

use axum::Json;
use utoipa::OpenApi;

use super::error::ErrorResponse;
use super::handlers::{capabilities, features, health, map_config};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asset Feature Service",
        description = "Asset features by bounding box and map configuration documents."
    ),
    paths(
        capabilities::landing_handler,
        capabilities::conformance_handler,
        capabilities::collections_handler,
        capabilities::collection_handler,
        capabilities::queryables_handler,
        features::items_handler,
        features::feature_handler,
        map_config::configurations_handler,
        map_config::configuration_handler,
        health::health_handler,
        health::liveness_handler,
        health::readiness_handler,
    ),
    components(schemas(
        ErrorResponse,
        capabilities::Link,
        capabilities::LandingPage,
        capabilities::Conformance,
        capabilities::Collection,
        capabilities::Collections,
        capabilities::Queryable,
        capabilities::Queryables,
    )),
    tags(
        (name = "capabilities", description = "Landing page, conformance and collections"),
        (name = "features", description = "Feature retrieval"),
        (name = "configurations", description = "Map configuration documents"),
        (name = "health", description = "Liveness and readiness")
    )
)]
pub struct ApiDoc;

pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
