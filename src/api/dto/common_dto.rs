//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::PublishReport;

/// Response body for endpoints that publish an event (202 Accepted).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublishResponse {
    /// Type tag of the published event.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that missed the event because their queue was full.
    pub dropped: usize,
    /// Subscribers registered after publishing.
    pub subscribers: usize,
}

impl PublishResponse {
    /// Builds the response from a broker report.
    #[must_use]
    pub fn new(event_type: &str, report: PublishReport, subscribers: usize) -> Self {
        Self {
            event_type: event_type.to_string(),
            delivered: report.delivered,
            dropped: report.dropped,
            subscribers,
        }
    }
}

/// Generic acknowledgement body, e.g. `{"status": "accepted"}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Short status word.
    pub status: String,
}

impl StatusResponse {
    /// `{"status": "accepted"}`.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }
}
