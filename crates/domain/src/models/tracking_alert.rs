//! Tracking alert domain model.
//!
//! Alerts are raised for supervisors when a subject's pings look spoofed or
//! leave the allowed area.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geodesy::Coordinate;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackingAlertType {
    SpoofSuspected,
    OutsideGeofence,
}

impl TrackingAlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingAlertType::SpoofSuspected => "spoof_suspected",
            TrackingAlertType::OutsideGeofence => "outside_geofence",
        }
    }
}

impl std::fmt::Display for TrackingAlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingAlert {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub alert_type: TrackingAlertType,
    pub coordinate: Coordinate,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl TrackingAlert {
    /// Alert for an implausible jump between consecutive pings.
    pub fn spoof_suspected(
        subject_id: Uuid,
        coordinate: Coordinate,
        jump_meters: Option<f64>,
        speed_mps: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let message = match (jump_meters, speed_mps) {
            (Some(d), Some(v)) => format!(
                "Suspicious GPS movement: {:.0} m at {:.1} m/s since the previous ping",
                d, v
            ),
            _ => "Suspicious GPS movement detected".to_string(),
        };
        Self {
            id: Uuid::new_v4(),
            subject_id,
            alert_type: TrackingAlertType::SpoofSuspected,
            coordinate,
            message,
            distance_meters: jump_meters,
            created_at,
        }
    }

    /// Alert for a ping outside every assigned zone.
    pub fn outside_geofence(
        subject_id: Uuid,
        coordinate: Coordinate,
        nearest_distance_meters: Option<f64>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let message = match nearest_distance_meters {
            Some(d) => format!("Outside allowed geofence area ({:.0} m from nearest zone)", d),
            None => "Outside allowed geofence area".to_string(),
        };
        Self {
            id: Uuid::new_v4(),
            subject_id,
            alert_type: TrackingAlertType::OutsideGeofence,
            coordinate,
            message,
            distance_meters: nearest_distance_meters,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoof_alert_message() {
        let alert = TrackingAlert::spoof_suspected(
            Uuid::new_v4(),
            Coordinate::new(1.0, 0.0),
            Some(111_194.9),
            Some(1853.2),
            Utc::now(),
        );
        assert_eq!(alert.alert_type, TrackingAlertType::SpoofSuspected);
        assert_eq!(
            alert.message,
            "Suspicious GPS movement: 111195 m at 1853.2 m/s since the previous ping"
        );
    }

    #[test]
    fn test_outside_alert_without_distance() {
        let alert =
            TrackingAlert::outside_geofence(Uuid::new_v4(), Coordinate::new(0.0, 0.0), None, Utc::now());
        assert_eq!(alert.message, "Outside allowed geofence area");
        assert!(alert.distance_meters.is_none());

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["alertType"], "outside_geofence");
    }
}
