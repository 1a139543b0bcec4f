//! Frames sent on the event stream besides relayed broker events.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::SubscriptionId;

/// Name of the greeting frame sent when a stream opens.
pub const HELLO_EVENT: &str = "hello";

/// Data of the `hello` frame.
#[derive(Debug, Clone, Serialize)]
pub struct StreamGreeting {
    /// Always `"connected"`.
    pub status: &'static str,
    /// Subscription serving this connection.
    pub subscription_id: SubscriptionId,
    /// Server time when the stream opened.
    pub time: DateTime<Utc>,
}

impl StreamGreeting {
    /// Builds the greeting for a freshly registered subscription.
    #[must_use]
    pub fn connected(subscription_id: SubscriptionId) -> Self {
        Self {
            status: "connected",
            subscription_id,
            time: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn greeting_serializes_with_subscription_id() {
        let id = SubscriptionId::new();
        let Ok(json) = serde_json::to_value(StreamGreeting::connected(id)) else {
            panic!("serialization failed");
        };
        assert_eq!(json["status"], "connected");
        assert_eq!(json["subscription_id"], id.to_string());
        assert!(json["time"].is_string());
    }
}
