//! Axum Server-Sent-Events handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::sse::{KeepAlive, Sse};

use super::consumer::event_stream;
use crate::app_state::AppState;

/// `GET /sse` — Open a Server-Sent-Events stream of registry events.
#[utoipa::path(
    get,
    path = "/sse",
    tag = "Events",
    summary = "Subscribe to registry events",
    description = "Opens a text/event-stream. The first frame is `event: hello`; every published registry event follows as an unnamed frame whose data is `{\"type\": ..., \"payload\": {...}}`. Keep-alive comments are sent periodically.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = String),
    )
)]
pub async fn sse_handler(State(state): State<AppState>) -> impl IntoResponse {
    let subscription = state.broker.subscribe();
    tracing::info!(
        subscription_id = %subscription.id(),
        subscribers = state.broker.subscriber_count(),
        "event stream opened"
    );

    let sse = Sse::new(event_stream(subscription, state.stream))
        .keep_alive(KeepAlive::new().interval(state.stream.keep_alive));

    ([("x-accel-buffering", "no")], sse)
}
