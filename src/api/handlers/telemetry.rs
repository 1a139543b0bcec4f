//! Field device telemetry ingestion.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Map, Value};

use crate::api::dto::{PublishResponse, TelemetryRequest};
use crate::app_state::AppState;
use crate::domain::{EventKind, RegistryEvent};
use crate::error::{ErrorResponse, RelayError};

/// `POST /telemetry` — Relay a GPS or photo reading from a field device.
///
/// # Errors
///
/// Returns [`RelayError::InvalidTelemetry`] when the device id is blank or
/// the coordinates are out of range, [`RelayError::Serialization`] if the
/// reading cannot be encoded.
#[utoipa::path(
    post,
    path = "/api/v1/telemetry",
    tag = "Telemetry",
    summary = "Ingest a device reading",
    description = "Publishes `iot_photo` when `photo_ipfs` is set, otherwise `iot_gps`. The payload echoes the reading with `ts` defaulted to the time of receipt.",
    request_body = TelemetryRequest,
    responses(
        (status = 202, description = "Reading published", body = PublishResponse),
        (status = 400, description = "Invalid reading", body = ErrorResponse),
        (status = 500, description = "Reading could not be encoded", body = ErrorResponse),
    )
)]
pub async fn ingest_telemetry(
    State(state): State<AppState>,
    Json(req): Json<TelemetryRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let event = telemetry_event(req)?;
    let report = state.broker.publish(&event)?;
    tracing::debug!(event_type = event.event_type(), "telemetry relayed");
    let response = PublishResponse::new(
        event.event_type(),
        report,
        state.broker.subscriber_count(),
    );
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Telemetry routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/telemetry", post(ingest_telemetry))
}

fn telemetry_event(req: TelemetryRequest) -> Result<RegistryEvent, RelayError> {
    let device_id = req.device_id.trim();
    if device_id.is_empty() {
        return Err(RelayError::InvalidTelemetry(
            "device_id must not be empty".to_string(),
        ));
    }
    if !req.lat.is_finite() || !(-90.0..=90.0).contains(&req.lat) {
        return Err(RelayError::InvalidTelemetry(format!(
            "lat {} outside [-90, 90]",
            req.lat
        )));
    }
    if !req.lon.is_finite() || !(-180.0..=180.0).contains(&req.lon) {
        return Err(RelayError::InvalidTelemetry(format!(
            "lon {} outside [-180, 180]",
            req.lon
        )));
    }
    let photo = match req.photo_ipfs.as_deref().map(str::trim) {
        Some("") => {
            return Err(RelayError::InvalidTelemetry(
                "photo_ipfs must not be empty".to_string(),
            ));
        }
        other => other,
    };

    let mut payload = Map::new();
    payload.insert("device_id".to_string(), Value::from(device_id));
    payload.insert(
        "project_id".to_string(),
        req.project_id.map_or(Value::Null, Value::from),
    );
    payload.insert("lat".to_string(), Value::from(req.lat));
    payload.insert("lon".to_string(), Value::from(req.lon));
    let ts = req.ts.unwrap_or_else(Utc::now);
    payload.insert("ts".to_string(), Value::from(ts.to_rfc3339()));

    let kind = match photo {
        Some(hash) => {
            payload.insert("photo_ipfs".to_string(), Value::from(hash));
            EventKind::IotPhoto
        }
        None => EventKind::IotGps,
    };
    Ok(RegistryEvent::of_kind(kind, payload))
}
