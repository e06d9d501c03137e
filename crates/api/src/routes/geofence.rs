//! Read-only geofence preview.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::services::EvaluationResult;
use serde::Deserialize;
use shared::geodesy::Coordinate;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeofencePreviewRequest {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    #[serde(alias = "lat")]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    #[serde(alias = "lng")]
    pub longitude: f64,
}

/// Evaluate a coordinate against the subject's zones without recording it.
///
/// POST /api/v1/subjects/:subject_id/geofence/evaluate
pub async fn preview(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Json(request): Json<GeofencePreviewRequest>,
) -> Result<Json<EvaluationResult>, ApiError> {
    request.validate()?;

    let result = state
        .attendance
        .preview_geofence(
            subject_id,
            Coordinate::new(request.latitude, request.longitude),
        )
        .await?;
    Ok(Json(result))
}
