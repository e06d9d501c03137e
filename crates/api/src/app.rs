use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    AttendanceService, Collaborators, DisabledFaceMatcher, FaceMatcher, InMemoryAlertSink,
    InMemoryAttendanceStore, InMemoryDirectory, InMemoryLocationHistory,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{attendance, geofence, health, tracking};
use crate::services::{FaceMatchError, HttpFaceMatcher};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub attendance: Arc<AttendanceService>,
}

/// Wires the attendance service onto in-memory storage seeded with
/// `directory`, using the HTTP face matcher when it is enabled.
pub fn build_attendance_service(
    config: &Config,
    directory: InMemoryDirectory,
) -> Result<AttendanceService, FaceMatchError> {
    let faces: Arc<dyn FaceMatcher> = if config.face_match.enabled {
        let matcher = HttpFaceMatcher::new(&config.face_match)?;
        info!(endpoint = %matcher.endpoint(), "Face matching enabled");
        Arc::new(matcher)
    } else {
        Arc::new(DisabledFaceMatcher)
    };

    let collaborators = Collaborators {
        directory: Arc::new(directory),
        history: Arc::new(InMemoryLocationHistory::new()),
        attendance: Arc::new(InMemoryAttendanceStore::new()),
        alerts: Arc::new(InMemoryAlertSink::new()),
        faces,
    };

    Ok(AttendanceService::new(
        collaborators,
        config.attendance_settings(),
    ))
}

pub fn create_app(config: Config, attendance: Arc<AttendanceService>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        config: config.clone(),
        attendance,
    };

    let subject_routes = Router::new()
        .route(
            "/api/v1/subjects/:subject_id/check-in",
            post(attendance::check_in),
        )
        .route(
            "/api/v1/subjects/:subject_id/check-out",
            post(attendance::check_out),
        )
        .route(
            "/api/v1/subjects/:subject_id/locations",
            post(tracking::record_location),
        )
        .route(
            "/api/v1/subjects/:subject_id/geofence/evaluate",
            post(geofence::preview),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Later layers wrap earlier ones, so trace_id runs first.
    Router::new()
        .merge(public_routes)
        .merge(subject_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .with_state(state)
}
