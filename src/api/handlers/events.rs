//! Event publishing handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::{PublishEventRequest, PublishResponse};
use crate::app_state::AppState;
use crate::domain::RegistryEvent;
use crate::domain::event::is_valid_event_type;
use crate::error::{ErrorResponse, RelayError};

/// `POST /events` — Publish a registry event to all stream subscribers.
///
/// # Errors
///
/// Returns [`RelayError::InvalidEventType`] for a malformed tag and
/// [`RelayError::InvalidRequest`] when the payload is not a JSON object,
/// [`RelayError::Serialization`] if the event cannot be encoded.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Publish an event",
    description = "Relays an event to every open `/sse` stream. Delivery is best-effort: subscribers with a full queue miss the event and are counted in `dropped`.",
    request_body = PublishEventRequest,
    responses(
        (status = 202, description = "Event published", body = PublishResponse),
        (status = 400, description = "Invalid event type or payload", body = ErrorResponse),
        (status = 500, description = "Event could not be encoded", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Json(req): Json<PublishEventRequest>,
) -> Result<impl IntoResponse, RelayError> {
    let event = parse_event(req)?;
    let report = state.broker.publish(&event)?;
    let response = PublishResponse::new(
        event.event_type(),
        report,
        state.broker.subscriber_count(),
    );
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(publish_event))
}

fn parse_event(req: PublishEventRequest) -> Result<RegistryEvent, RelayError> {
    let event_type = req.event_type.trim();
    if !is_valid_event_type(event_type) {
        return Err(RelayError::InvalidEventType(event_type.to_string()));
    }
    let payload = match req.payload {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(RelayError::InvalidRequest(
                "payload must be a JSON object".to_string(),
            ));
        }
    };
    Ok(RegistryEvent::new(event_type, payload))
}
