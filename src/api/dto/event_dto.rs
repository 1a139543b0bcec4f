//! DTOs for publishing arbitrary registry events.

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /api/v1/events`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishEventRequest {
    /// Event type tag (1–64 chars of `[A-Za-z0-9_.-]`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload; must be a JSON object when present.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}
