//! Check-in and check-out endpoint handlers.
//!
//! Rejections are decisions, not errors: they come back as 422 with the
//! full decision payload so the client can show the reason and distance.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::AttendanceRequest;
use domain::services::{AttendanceCommand, AttendanceOutcome};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_attendance_decision;

fn command(request: AttendanceRequest) -> AttendanceCommand {
    AttendanceCommand {
        coordinate: request.coordinate(),
        telemetry: request.telemetry(),
        photo: request.photo,
        now: Utc::now(),
    }
}

fn respond(
    accepted: StatusCode,
    outcome: AttendanceOutcome,
) -> (StatusCode, Json<AttendanceOutcome>) {
    record_attendance_decision(outcome.kind, &outcome.decision);
    let status = if outcome.decision.accept {
        accepted
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(outcome))
}

/// Check in for the current UTC day.
///
/// POST /api/v1/subjects/:subject_id/check-in
pub async fn check_in(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<AttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceOutcome>), ApiError> {
    request.validate()?;

    let outcome = state
        .attendance
        .check_in(subject_id, command(request))
        .await?;
    Ok(respond(StatusCode::CREATED, outcome))
}

/// Check out of today's session.
///
/// POST /api/v1/subjects/:subject_id/check-out
pub async fn check_out(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<AttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceOutcome>), ApiError> {
    request.validate()?;

    let outcome = state
        .attendance
        .check_out(subject_id, command(request))
        .await?;
    Ok(respond(StatusCode::OK, outcome))
}
