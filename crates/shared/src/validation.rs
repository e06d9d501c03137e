//! Validators for location payloads submitted by field devices.
//!
//! The geofence and spoof checks themselves never validate; anything that
//! reaches them has passed these checks at the API boundary.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Buffered tracking pings older than this are refused (24 hours).
const MAX_PING_AGE_SECS: i64 = 86_400;

/// Allowed clock skew for device timestamps (5 minutes).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 300;

fn range_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is finite and within -90..=90.
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(range_error(
            "latitude_range",
            "Latitude must be between -90 and 90",
        ))
    }
}

/// Validates that a longitude value is finite and within -180..=180.
pub fn validate_longitude(lng: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(range_error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates that a reported GPS accuracy radius is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        Err(range_error(
            "accuracy_range",
            "Accuracy must be non-negative",
        ))
    }
}

/// Validates that a reported speed is non-negative.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        Err(range_error("speed_range", "Speed must be non-negative"))
    }
}

/// Validates that battery level is a percentage.
pub fn validate_battery_level(level: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&level) {
        Ok(())
    } else {
        Err(range_error(
            "battery_range",
            "Battery level must be between 0 and 100",
        ))
    }
}

/// Validates a device timestamp in milliseconds since epoch.
///
/// Accepts up to 5 minutes of clock skew into the future and buffered pings
/// up to 24 hours old.
pub fn validate_timestamp(timestamp_millis: i64) -> Result<(), ValidationError> {
    let Some(timestamp) = Utc.timestamp_millis_opt(timestamp_millis).single() else {
        return Err(range_error("timestamp_invalid", "Invalid timestamp format"));
    };

    let now = Utc::now();
    if timestamp > now + chrono::Duration::seconds(MAX_FUTURE_TOLERANCE_SECS) {
        return Err(range_error(
            "timestamp_future",
            "Timestamp cannot be in the future",
        ));
    }
    if timestamp < now - chrono::Duration::seconds(MAX_PING_AGE_SECS) {
        return Err(range_error(
            "timestamp_old",
            "Timestamp cannot be older than 24 hours",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(-6.914744).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_rejects_nan() {
        let err = validate_latitude(f64::NAN).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(107.609810).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_accuracy_and_speed() {
        assert!(validate_accuracy(0.0).is_ok());
        assert!(validate_accuracy(35.5).is_ok());
        assert!(validate_accuracy(-1.0).is_err());

        assert!(validate_speed(0.0).is_ok());
        assert!(validate_speed(13.9).is_ok());
        assert!(validate_speed(-0.5).is_err());
        assert!(validate_speed(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_battery_level() {
        assert!(validate_battery_level(0).is_ok());
        assert!(validate_battery_level(100).is_ok());
        assert!(validate_battery_level(-1).is_err());
        assert!(validate_battery_level(101).is_err());
    }

    #[test]
    fn test_validate_timestamp_window() {
        let now = Utc::now();
        assert!(validate_timestamp(now.timestamp_millis()).is_ok());
        assert!(validate_timestamp((now - chrono::Duration::hours(23)).timestamp_millis()).is_ok());
        assert!(validate_timestamp((now + chrono::Duration::minutes(4)).timestamp_millis()).is_ok());

        let err =
            validate_timestamp((now - chrono::Duration::hours(25)).timestamp_millis()).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Timestamp cannot be older than 24 hours"
        );

        let err =
            validate_timestamp((now + chrono::Duration::minutes(10)).timestamp_millis()).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Timestamp cannot be in the future"
        );
    }
}
