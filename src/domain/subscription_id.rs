//! Type-safe subscription identifier.
//!
//! [`SubscriptionId`] wraps a [`uuid::Uuid`] (v4) so that broker
//! registrations cannot be confused with record identifiers that travel
//! inside event payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one broker subscription.
///
/// Generated once in [`super::EventBroker::subscribe`] and used as the key
/// of the broker registry and as a structured logging field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(uuid::Uuid);

impl SubscriptionId {
    /// Creates a new random `SubscriptionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for SubscriptionId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
