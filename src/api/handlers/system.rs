//! System endpoints: health check and service index.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::BrokerStats;

/// Broker counters reported by the health check.
#[derive(Debug, Serialize, ToSchema)]
struct BrokerHealth {
    subscribers: usize,
    published: u64,
    delivered: u64,
    dropped: u64,
    queue_capacity: usize,
}

impl BrokerHealth {
    fn new(stats: BrokerStats, queue_capacity: usize) -> Self {
        Self {
            subscribers: stats.subscribers,
            published: stats.published,
            delivered: stats.delivered,
            dropped: stats.dropped,
            queue_capacity,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    broker: BrokerHealth,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, current timestamp and event broker counters. Reports `shutting_down` with 503 once the broker has been closed.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is shutting down", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status_code, status) = if state.broker.is_shut_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
    } else {
        (StatusCode::OK, "healthy")
    };
    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            broker: BrokerHealth::new(state.broker.stats(), state.broker.queue_capacity()),
        }),
    )
}

/// Entry of the endpoint catalog.
#[derive(Debug, Serialize, ToSchema)]
struct EndpointInfo {
    name: &'static str,
    method: &'static str,
    path: &'static str,
}

/// Service index response.
#[derive(Debug, Serialize, ToSchema)]
struct IndexResponse {
    message: &'static str,
    version: &'static str,
    status: &'static str,
    endpoints: Vec<EndpointInfo>,
}

/// `GET /` — Service index.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service index",
    description = "Names the service and lists its endpoints.",
    responses(
        (status = 200, description = "Endpoint catalog", body = IndexResponse),
    )
)]
pub async fn index_handler() -> impl IntoResponse {
    let endpoints = vec![
        EndpointInfo {
            name: "sse",
            method: "GET",
            path: "/sse",
        },
        EndpointInfo {
            name: "events",
            method: "POST",
            path: "/api/v1/events",
        },
        EndpointInfo {
            name: "telemetry",
            method: "POST",
            path: "/api/v1/telemetry",
        },
        EndpointInfo {
            name: "logs",
            method: "POST",
            path: "/api/logs",
        },
        EndpointInfo {
            name: "health",
            method: "GET",
            path: "/health",
        },
        EndpointInfo {
            name: "openapi",
            method: "GET",
            path: "/api-docs/openapi.json",
        },
    ];
    (
        StatusCode::OK,
        Json(IndexResponse {
            message: "Blue Carbon Registry event relay",
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
            endpoints,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}
