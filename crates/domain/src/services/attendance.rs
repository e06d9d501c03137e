//! Attendance orchestration.
//!
//! Wraps the pure decision pipeline with the I/O around a check-in,
//! check-out or tracking ping: subject lookup, face verification, history
//! lookup, persistence and alerting.
//!
//! Concurrent submissions for the same subject are not serialized here. The
//! duplicate lookups answer early; the attendance store's unique
//! (subject, day, kind) rule settles races.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::geodesy::Coordinate;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::attendance_decision::{AttendanceDecision, AttendanceDecisionPipeline, RejectionReason};
use super::geofence::{EvaluationResult, GeofenceCheck};
use super::ports::{
    AlertSink, AttendanceStore, FaceMatchOutcome, FaceMatcher, LocationHistory, StoreError,
    SubjectDirectory,
};
use super::spoof_detection::{SpoofCheck, SpoofSignal, SpoofThresholds};
use crate::models::attendance::{AttendanceKind, AttendanceRecord};
use crate::models::location::{LocationPing, Telemetry};
use crate::models::subject::Subject;
use crate::models::tracking_alert::{TrackingAlert, TrackingAlertType};

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("Subject {0} has already checked in today")]
    AlreadyCheckedIn(Uuid),

    #[error("Subject {0} has not checked in today")]
    NoOpenSession(Uuid),

    #[error("Subject {0} has already checked out today")]
    AlreadyCheckedOut(Uuid),

    #[error("A photo is required for face verification")]
    PhotoRequired,

    #[error("Face verification unavailable: {0}")]
    FaceServiceUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Collaborators the service talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn SubjectDirectory>,
    pub history: Arc<dyn LocationHistory>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub alerts: Arc<dyn AlertSink>,
    pub faces: Arc<dyn FaceMatcher>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceSettings {
    pub spoof: SpoofThresholds,
    /// Refuse attendance without a matched face.
    pub require_face_match: bool,
}

/// Input for a check-in or check-out.
#[derive(Debug, Clone)]
pub struct AttendanceCommand {
    pub coordinate: Coordinate,
    pub telemetry: Telemetry,
    pub photo: Option<String>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceOutcome {
    pub kind: AttendanceKind,
    pub decision: AttendanceDecision,
    pub face_match: FaceMatchOutcome,
    /// Present only when the attempt was accepted and stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
}

/// Input for a continuous tracking ping.
#[derive(Debug, Clone)]
pub struct LocationCommand {
    pub coordinate: Coordinate,
    pub telemetry: Telemetry,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingOutcome {
    /// False when the ping was refused as spoofed.
    pub accepted: bool,
    pub inside_geofence: Option<bool>,
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spoof_signals: Vec<SpoofSignal>,
    pub alert: Option<TrackingAlertType>,
}

pub struct AttendanceService {
    collaborators: Collaborators,
    pipeline: AttendanceDecisionPipeline,
    require_face_match: bool,
}

impl AttendanceService {
    pub fn new(collaborators: Collaborators, settings: AttendanceSettings) -> Self {
        Self {
            collaborators,
            pipeline: AttendanceDecisionPipeline::new(settings.spoof),
            require_face_match: settings.require_face_match,
        }
    }

    pub async fn check_in(
        &self,
        subject_id: Uuid,
        command: AttendanceCommand,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let subject = self.load_subject(subject_id).await?;
        let day = command.now.date_naive();

        if self
            .collaborators
            .attendance
            .find_for_day(subject_id, day, AttendanceKind::CheckIn)
            .await?
            .is_some()
        {
            return Err(AttendanceError::AlreadyCheckedIn(subject_id));
        }

        self.attend(&subject, AttendanceKind::CheckIn, command, None)
            .await
    }

    pub async fn check_out(
        &self,
        subject_id: Uuid,
        command: AttendanceCommand,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let subject = self.load_subject(subject_id).await?;
        let day = command.now.date_naive();
        let store = &self.collaborators.attendance;

        let session = store
            .find_for_day(subject_id, day, AttendanceKind::CheckIn)
            .await?
            .ok_or(AttendanceError::NoOpenSession(subject_id))?;

        if store
            .find_for_day(subject_id, day, AttendanceKind::CheckOut)
            .await?
            .is_some()
        {
            return Err(AttendanceError::AlreadyCheckedOut(subject_id));
        }

        self.attend(&subject, AttendanceKind::CheckOut, command, Some(session.id))
            .await
    }

    /// Records a tracking ping.
    ///
    /// A spoofed ping raises an alert and is not stored. A ping outside every
    /// zone is stored and raises an alert unless the subject may roam.
    pub async fn record_location(
        &self,
        subject_id: Uuid,
        command: LocationCommand,
    ) -> Result<TrackingOutcome, AttendanceError> {
        let subject = self.load_subject(subject_id).await?;
        let at = command.coordinate;

        if subject.policy.spoof_check_enabled {
            let prior = self.collaborators.history.latest_ping(subject_id).await?;
            let verdict = self
                .pipeline
                .spoof()
                .check(prior.as_ref(), at, command.recorded_at);
            if verdict.is_spoofed {
                self.raise(TrackingAlert::spoof_suspected(
                    subject_id,
                    at,
                    verdict.distance_meters,
                    verdict.speed_mps,
                    command.recorded_at,
                ))
                .await?;
                return Ok(TrackingOutcome {
                    accepted: false,
                    inside_geofence: None,
                    distance_meters: None,
                    spoof_signals: verdict.signals,
                    alert: Some(TrackingAlertType::SpoofSuspected),
                });
            }
        }

        let zones = self.collaborators.directory.effective_zones(&subject).await?;
        let evaluation = self.pipeline.geofence().evaluate(&zones, at);

        let mut alert = None;
        if !evaluation.inside_any && !subject.policy.allow_outside_geofence {
            self.raise(TrackingAlert::outside_geofence(
                subject_id,
                at,
                evaluation.nearest_distance_meters,
                command.recorded_at,
            ))
            .await?;
            alert = Some(TrackingAlertType::OutsideGeofence);
        }

        let session = self
            .collaborators
            .attendance
            .find_for_day(
                subject_id,
                command.recorded_at.date_naive(),
                AttendanceKind::CheckIn,
            )
            .await?;
        let ping = LocationPing::new(subject_id, at, command.recorded_at)
            .with_telemetry(command.telemetry)
            .with_attendance(session.map(|s| s.id));
        self.collaborators.history.append_ping(ping).await?;

        Ok(TrackingOutcome {
            accepted: true,
            inside_geofence: Some(evaluation.inside_any),
            distance_meters: evaluation.nearest_distance_meters,
            spoof_signals: Vec::new(),
            alert,
        })
    }

    /// Read-only geofence evaluation, e.g. for a "am I inside?" screen.
    pub async fn preview_geofence(
        &self,
        subject_id: Uuid,
        at: Coordinate,
    ) -> Result<EvaluationResult, AttendanceError> {
        let subject = self.load_subject(subject_id).await?;
        let zones = self.collaborators.directory.effective_zones(&subject).await?;
        Ok(self.pipeline.geofence().evaluate(&zones, at))
    }

    async fn load_subject(&self, subject_id: Uuid) -> Result<Subject, AttendanceError> {
        self.collaborators
            .directory
            .find_subject(subject_id)
            .await?
            .ok_or(AttendanceError::SubjectNotFound(subject_id))
    }

    async fn verify_face(
        &self,
        subject: &Subject,
        photo: Option<&str>,
    ) -> Result<FaceMatchOutcome, AttendanceError> {
        let Some(photo) = photo else {
            if self.require_face_match {
                return Err(AttendanceError::PhotoRequired);
            }
            return Ok(FaceMatchOutcome::Skipped);
        };

        let outcome = self.collaborators.faces.verify(subject.id, photo).await;
        match &outcome {
            FaceMatchOutcome::Unavailable { message } if self.require_face_match => {
                Err(AttendanceError::FaceServiceUnavailable(message.clone()))
            }
            FaceMatchOutcome::Skipped if self.require_face_match => Err(
                AttendanceError::FaceServiceUnavailable("face matching is disabled".to_string()),
            ),
            FaceMatchOutcome::Unavailable { message } => {
                warn!(
                    subject_id = %subject.id,
                    error = %message,
                    "Face verification unavailable, continuing without it"
                );
                Ok(outcome)
            }
            _ => Ok(outcome),
        }
    }

    async fn attend(
        &self,
        subject: &Subject,
        kind: AttendanceKind,
        command: AttendanceCommand,
        session_id: Option<Uuid>,
    ) -> Result<AttendanceOutcome, AttendanceError> {
        let face_match = self.verify_face(subject, command.photo.as_deref()).await?;
        if let FaceMatchOutcome::Mismatched { confidence } = face_match {
            info!(
                subject_id = %subject.id,
                kind = %kind,
                confidence,
                "Attendance rejected: face mismatch"
            );
            return Ok(AttendanceOutcome {
                kind,
                decision: AttendanceDecision::rejected(RejectionReason::FaceMismatch),
                face_match,
                record: None,
            });
        }

        let zones = self.collaborators.directory.effective_zones(subject).await?;
        let prior = self.collaborators.history.latest_ping(subject.id).await?;
        let decision = self.pipeline.decide(
            subject,
            &zones,
            prior.as_ref(),
            command.coordinate,
            command.now,
        );

        if decision.is_anomaly {
            self.raise(TrackingAlert::spoof_suspected(
                subject.id,
                command.coordinate,
                decision.jump_meters,
                decision.speed_mps,
                command.now,
            ))
            .await?;
        }

        if !decision.accept {
            info!(
                subject_id = %subject.id,
                kind = %kind,
                reason = ?decision.reason,
                distance_meters = ?decision.distance_meters,
                "Attendance rejected"
            );
            return Ok(AttendanceOutcome {
                kind,
                decision,
                face_match,
                record: None,
            });
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            subject_id: subject.id,
            kind,
            coordinate: command.coordinate,
            inside_geofence: decision.inside_any.unwrap_or(false),
            distance_meters: decision.distance_meters,
            nearest_zone_id: decision.nearest_zone_id,
            is_anomaly: decision.is_anomaly,
            face_verified: face_match.verified(),
            recorded_at: command.now,
        };
        let record = match self.collaborators.attendance.save(record).await {
            Ok(record) => record,
            Err(StoreError::Conflict(detail)) => {
                info!(
                    subject_id = %subject.id,
                    kind = %kind,
                    %detail,
                    "Duplicate attendance refused"
                );
                return Err(match kind {
                    AttendanceKind::CheckIn => AttendanceError::AlreadyCheckedIn(subject.id),
                    AttendanceKind::CheckOut => AttendanceError::AlreadyCheckedOut(subject.id),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let ping = LocationPing::new(subject.id, command.coordinate, command.now)
            .with_telemetry(command.telemetry)
            .with_attendance(Some(session_id.unwrap_or(record.id)));
        self.collaborators.history.append_ping(ping).await?;

        info!(
            subject_id = %subject.id,
            attendance_id = %record.id,
            kind = %kind,
            inside_geofence = record.inside_geofence,
            "Attendance recorded"
        );

        Ok(AttendanceOutcome {
            kind,
            decision,
            face_match,
            record: Some(record),
        })
    }

    async fn raise(&self, alert: TrackingAlert) -> Result<(), AttendanceError> {
        warn!(
            subject_id = %alert.subject_id,
            alert_type = %alert.alert_type,
            message = %alert.message,
            "Tracking alert raised"
        );
        self.collaborators.alerts.raise(alert).await?;
        Ok(())
    }
}
