//! Shared application state injected into all Axum handlers.

use crate::config::StreamSettings;
use crate::domain::EventBroker;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event broker shared by producers and stream consumers.
    pub broker: EventBroker,
    /// Settings applied to every `/sse` connection.
    pub stream: StreamSettings,
}

impl AppState {
    /// Creates state around an existing broker.
    #[must_use]
    pub fn new(broker: EventBroker, stream: StreamSettings) -> Self {
        Self { broker, stream }
    }
}
