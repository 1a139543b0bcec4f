//! DTOs for frontend log ingestion.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /api/logs`. Every field is optional; values of
/// another JSON type are logged as their text rendering.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClientLogRequest {
    /// Log level name (`DEBUG`, `INFO`, `WARN`, `ERROR`). Defaults to `INFO`.
    #[serde(default)]
    pub level: Option<String>,
    /// Log message.
    #[serde(default)]
    pub message: Option<String>,
    /// Emitting frontend component. Defaults to `frontend`.
    #[serde(default)]
    pub component: Option<String>,
    /// Arbitrary structured context.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub meta: Option<serde_json::Value>,
}
