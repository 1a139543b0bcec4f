//! Frontend log ingestion.
//!
//! Dashboard and mobile clients post their log lines here so they end up
//! in the server's tracing output next to relay events.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Map, Value};

use crate::api::dto::{ClientLogRequest, StatusResponse};
use crate::app_state::AppState;

/// Client-side log severity, parsed leniently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl ClientLevel {
    fn parse(level: &str) -> Self {
        match level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Self::Trace,
            "DEBUG" => Self::Debug,
            "WARN" | "WARNING" => Self::Warn,
            "ERROR" | "CRITICAL" | "FATAL" => Self::Error,
            _ => Self::Info,
        }
    }
}

/// A client log line with every field resolved independently.
///
/// A field with an unexpected JSON type is rendered as text instead of
/// discarding the rest of the entry.
#[derive(Debug, PartialEq)]
struct ClientEntry {
    level: ClientLevel,
    message: String,
    component: String,
    meta: Value,
}

impl ClientEntry {
    fn from_body(body: &[u8]) -> Self {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            level: text_field(&fields, "level")
                .map_or(ClientLevel::Info, |level| ClientLevel::parse(&level)),
            message: text_field(&fields, "message").unwrap_or_default(),
            component: text_field(&fields, "component")
                .unwrap_or_else(|| "frontend".to_string()),
            meta: fields.get("meta").cloned().unwrap_or_default(),
        }
    }
}

/// Returns a field as text; non-string values use their JSON rendering.
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// `POST /api/logs` — Record a frontend log line.
///
/// Never fails: a missing or malformed body is logged with defaults.
#[utoipa::path(
    post,
    path = "/api/logs",
    tag = "System",
    summary = "Ingest a client log line",
    description = "Re-emits the line through the server's structured logger. All fields are optional; level defaults to INFO and component to `frontend`.",
    request_body = ClientLogRequest,
    responses(
        (status = 202, description = "Log accepted", body = StatusResponse),
    )
)]
pub async fn ingest_logs(body: Bytes) -> impl IntoResponse {
    let ClientEntry {
        level,
        message,
        component,
        meta,
    } = ClientEntry::from_body(&body);
    let component = component.as_str();

    match level {
        ClientLevel::Trace => {
            tracing::trace!(target: "client", component, %meta, "{message}");
        }
        ClientLevel::Debug => {
            tracing::debug!(target: "client", component, %meta, "{message}");
        }
        ClientLevel::Info => {
            tracing::info!(target: "client", component, %meta, "{message}");
        }
        ClientLevel::Warn => {
            tracing::warn!(target: "client", component, %meta, "{message}");
        }
        ClientLevel::Error => {
            tracing::error!(target: "client", component, %meta, "{message}");
        }
    }

    (StatusCode::ACCEPTED, Json(StatusResponse::accepted()))
}

/// Log ingestion routes, mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/logs", post(ingest_logs))
}
