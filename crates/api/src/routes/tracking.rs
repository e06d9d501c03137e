//! Continuous tracking endpoint handler.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{TimeZone, Utc};
use domain::models::RecordLocationRequest;
use domain::services::{LocationCommand, TrackingOutcome};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_tracking_alert;

/// Record a tracking ping.
///
/// POST /api/v1/subjects/:subject_id/locations
///
/// 201 when stored, 422 when refused as spoofed.
pub async fn record_location(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<RecordLocationRequest>,
) -> Result<(StatusCode, Json<TrackingOutcome>), ApiError> {
    request.validate()?;

    let recorded_at = match request.timestamp {
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| ApiError::Validation("Invalid timestamp".to_string()))?,
        None => Utc::now(),
    };

    let outcome = state
        .attendance
        .record_location(
            subject_id,
            LocationCommand {
                coordinate: request.coordinate(),
                telemetry: request.telemetry(),
                recorded_at,
            },
        )
        .await?;

    if let Some(alert) = outcome.alert {
        record_tracking_alert(alert);
    }
    debug!(
        subject_id = %subject_id,
        accepted = outcome.accepted,
        inside_geofence = ?outcome.inside_geofence,
        "Tracking ping processed"
    );

    let status = if outcome.accepted {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(outcome)))
}
