//! DTOs for field device telemetry.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /api/v1/telemetry`.
///
/// A reading with `photo_ipfs` is relayed as `iot_photo`, otherwise as
/// `iot_gps`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TelemetryRequest {
    /// Reporting device.
    pub device_id: String,
    /// Restoration project the device belongs to.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Latitude in degrees, within [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180].
    pub lon: f64,
    /// IPFS content hash of a photo taken at this position.
    #[serde(default)]
    pub photo_ipfs: Option<String>,
    /// Device timestamp; defaults to the time of receipt.
    #[serde(default)]
    pub ts: Option<DateTime<Utc>>,
}
