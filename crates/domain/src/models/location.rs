//! Location ping domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geodesy::Coordinate;
use uuid::Uuid;
use validator::Validate;

/// Device telemetry carried alongside a ping. Stored as-is; no check reads it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
}

/// A timestamped position reading for a subject. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationPing {
    pub id: Uuid,
    pub subject_id: Uuid,
    /// Attendance session the ping was taken under, if any.
    pub attendance_id: Option<Uuid>,
    pub coordinate: Coordinate,
    #[serde(flatten)]
    pub telemetry: Telemetry,
    pub recorded_at: DateTime<Utc>,
}

impl LocationPing {
    pub fn new(subject_id: Uuid, coordinate: Coordinate, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject_id,
            attendance_id: None,
            coordinate,
            telemetry: Telemetry::default(),
            recorded_at,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_attendance(mut self, attendance_id: Option<Uuid>) -> Self {
        self.attendance_id = attendance_id;
        self
    }
}

/// Request payload for a continuous tracking ping.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordLocationRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    #[serde(alias = "lat")]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    #[serde(alias = "lng")]
    pub longitude: f64,

    /// Device capture time in milliseconds since epoch; server time when absent.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: Option<i64>,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,
}

impl RecordLocationRequest {
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
