//! Registry events relayed to stream subscribers.
//!
//! Every state change in the registry (a project created, a carbon credit
//! issued, a telemetry reading received) is described by a
//! [`RegistryEvent`] and handed to [`super::EventBroker::publish`]. Events
//! are never persisted; they only exist between publisher and subscribers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum length of an event type tag.
pub const MAX_EVENT_TYPE_LEN: usize = 64;

/// A serialized event, shared by every subscription queue it is delivered to.
pub type WireEvent = Arc<str>;

/// Event tags understood by the registry dashboard.
///
/// Tags are free-form strings on the wire; this enum only names the ones
/// the registry itself emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A restoration project was registered.
    ProjectCreated,
    /// A restoration project was modified.
    ProjectUpdated,
    /// Carbon credits were issued for a project.
    CarbonCreditIssued,
    /// A field measurement was recorded.
    FieldDataAdded,
    /// Service status changed.
    SystemStatusUpdate,
    /// Free-text notification for dashboard users.
    Notification,
    /// Several records changed at once.
    BulkUpdate,
    /// GPS position reported by a field device.
    IotGps,
    /// Photo reported by a field device (pinned to IPFS).
    IotPhoto,
}

impl EventKind {
    /// Returns the wire tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::ProjectUpdated => "project_updated",
            Self::CarbonCreditIssued => "carbon_credit_issued",
            Self::FieldDataAdded => "field_data_added",
            Self::SystemStatusUpdate => "system_status_update",
            Self::Notification => "notification",
            Self::BulkUpdate => "bulk_update",
            Self::IotGps => "iot_gps",
            Self::IotPhoto => "iot_photo",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable event record: a type tag plus a JSON object payload.
///
/// Serializes as `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: Map<String, Value>,
}

impl RegistryEvent {
    /// Creates an event with an arbitrary tag.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Creates an event of a well-known kind.
    #[must_use]
    pub fn of_kind(kind: EventKind, payload: Map<String, Value>) -> Self {
        Self::new(kind.as_str(), payload)
    }

    /// `project_created` with the new project's id and name.
    #[must_use]
    pub fn project_created(project_id: i64, name: &str) -> Self {
        Self::of_kind(
            EventKind::ProjectCreated,
            object([("id", Value::from(project_id)), ("name", Value::from(name))]),
        )
    }

    /// `carbon_credit_issued` for `amount` tonnes credited to a project.
    #[must_use]
    pub fn carbon_credit_issued(credit_id: i64, project_id: i64, amount: f64) -> Self {
        Self::of_kind(
            EventKind::CarbonCreditIssued,
            object([
                ("id", Value::from(credit_id)),
                ("project_id", Value::from(project_id)),
                ("amount", Value::from(amount)),
            ]),
        )
    }

    /// `field_data_added` for a new measurement on a project.
    #[must_use]
    pub fn field_data_added(record_id: i64, project_id: i64, data_type: &str) -> Self {
        Self::of_kind(
            EventKind::FieldDataAdded,
            object([
                ("id", Value::from(record_id)),
                ("project_id", Value::from(project_id)),
                ("data_type", Value::from(data_type)),
            ]),
        )
    }

    /// Returns the type tag.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns the payload object.
    #[must_use]
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Serializes the event into its shared wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if a payload value
    /// cannot be encoded.
    pub fn to_wire(&self) -> Result<WireEvent, serde_json::Error> {
        serde_json::to_string(self).map(WireEvent::from)
    }
}

/// Returns `true` if `tag` is an acceptable event type: 1 to
/// [`MAX_EVENT_TYPE_LEN`] ASCII alphanumerics, `_`, `-` or `.`.
#[must_use]
pub fn is_valid_event_type(tag: &str) -> bool {
    !tag.is_empty()
        && tag.len() <= MAX_EVENT_TYPE_LEN
        && tag
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

fn object<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
