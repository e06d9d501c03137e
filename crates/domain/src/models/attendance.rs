//! Attendance domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::geodesy::Coordinate;
use uuid::Uuid;
use validator::Validate;

use super::location::Telemetry;

/// Which end of a working day a record marks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

impl AttendanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceKind::CheckIn => "check_in",
            AttendanceKind::CheckOut => "check_out",
        }
    }
}

impl std::fmt::Display for AttendanceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted check-in or check-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub kind: AttendanceKind,
    pub coordinate: Coordinate,
    pub inside_geofence: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_zone_id: Option<Uuid>,
    /// Copied from the decision. Only accepted attempts are stored and a
    /// tripped spoof check always rejects, so this stays false here; spoofed
    /// attempts are audited through `SpoofSuspected` tracking alerts.
    pub is_anomaly: bool,
    /// `None` when no face verification ran.
    pub face_verified: Option<bool>,
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Calendar day (UTC) the record belongs to.
    pub fn day(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }
}

/// Request payload for check-in and check-out.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    #[serde(alias = "lat")]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    #[serde(alias = "lng")]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    /// Base64-encoded selfie for the face-match collaborator.
    #[validate(length(min = 1, message = "Photo must not be empty"))]
    pub photo: Option<String>,
}

impl AttendanceRequest {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            speed: self.speed,
            accuracy: self.accuracy,
            battery_level: self.battery_level,
        }
    }
}
