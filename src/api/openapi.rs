//! OpenAPI document for the relay.
//!
//! Served at `/api-docs/openapi.json`; with the `swagger-ui` feature the
//! interactive explorer is mounted at `/swagger-ui`.

use axum::Router;
use utoipa::OpenApi;

use super::handlers;
use crate::app_state::AppState;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Generated OpenAPI description of every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Blue Carbon Registry Event Relay",
        description = "Server-Sent-Events relay for project, carbon credit and field telemetry events."
    ),
    paths(
        crate::stream::handler::sse_handler,
        handlers::events::publish_event,
        handlers::telemetry::ingest_telemetry,
        handlers::logs::ingest_logs,
        handlers::system::health_handler,
        handlers::system::index_handler,
    ),
    tags(
        (name = "Events", description = "Publish registry events and subscribe to the stream"),
        (name = "Telemetry", description = "Field device readings"),
        (name = "System", description = "Health, index and client logs"),
    )
)]
pub struct ApiDoc;

/// Routes serving the OpenAPI document.
#[cfg(feature = "swagger-ui")]
pub fn routes() -> Router<AppState> {
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

/// Routes serving the OpenAPI document.
#[cfg(not(feature = "swagger-ui"))]
pub fn routes() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
