//! Common test utilities for integration tests.
//!
//! Builds the router on in-memory adapters and keeps handles to them so
//! tests can seed the directory and inspect what was stored.

#![allow(dead_code)]

use std::sync::Arc;

use attendance_api::{app::create_app, config::Config};
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::models::{Subject, SubjectPolicy, ZoneDefinition};
use fake::{faker::name::en::Name, Fake};
use domain::services::{
    AttendanceService, Collaborators, DisabledFaceMatcher, FaceMatchOutcome, FaceMatcher,
    InMemoryAlertSink, InMemoryAttendanceStore, InMemoryDirectory, InMemoryLocationHistory,
};
use shared::geodesy::Coordinate;
use uuid::Uuid;

/// Centre of the default office zone.
pub const OFFICE: Coordinate = Coordinate::new(-6.1818, 106.8283);

/// Radius of the default office zone in meters.
pub const OFFICE_RADIUS: f64 = 150.0;

/// Answers every verification with the same outcome.
pub struct FixedFaceMatcher(pub FaceMatchOutcome);

#[async_trait::async_trait]
impl FaceMatcher for FixedFaceMatcher {
    async fn verify(&self, _subject_id: Uuid, _image_base64: &str) -> FaceMatchOutcome {
        self.0.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub directory: Arc<InMemoryDirectory>,
    pub history: Arc<InMemoryLocationHistory>,
    pub attendance: Arc<InMemoryAttendanceStore>,
    pub alerts: Arc<InMemoryAlertSink>,
    pub subject: Subject,
    pub office: ZoneDefinition,
}

pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut all = vec![("logging.level", "debug"), ("logging.format", "pretty")];
    all.extend_from_slice(overrides);
    Config::from_overrides(&all).expect("Failed to build test config")
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(
        SubjectPolicy::default(),
        Arc::new(DisabledFaceMatcher),
        test_config(&[]),
    )
    .await
}

/// A subject with one circular office zone.
pub async fn create_test_app_with(
    policy: SubjectPolicy,
    faces: Arc<dyn FaceMatcher>,
    config: Config,
) -> TestApp {
    let directory = Arc::new(InMemoryDirectory::new());
    let history = Arc::new(InMemoryLocationHistory::new());
    let attendance = Arc::new(InMemoryAttendanceStore::new());
    let alerts = Arc::new(InMemoryAlertSink::new());

    let name: String = Name().fake();
    let subject = Subject::new(name).with_policy(policy);
    let office = ZoneDefinition::circle("Balai Kota", OFFICE, OFFICE_RADIUS);
    directory.insert_subject(subject.clone()).await;
    directory.insert_zone(office.clone()).await;
    directory.assign_to_subject(office.id, subject.id).await;

    let service = AttendanceService::new(
        Collaborators {
            directory: directory.clone(),
            history: history.clone(),
            attendance: attendance.clone(),
            alerts: alerts.clone(),
            faces,
        },
        config.attendance_settings(),
    );

    TestApp {
        router: create_app(config, Arc::new(service)),
        directory,
        history,
        attendance,
        alerts,
        subject,
        office,
    }
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

pub fn subject_uri(subject_id: Uuid, action: &str) -> String {
    format!("/api/v1/subjects/{}/{}", subject_id, action)
}
