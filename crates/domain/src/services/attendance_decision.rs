//! Attendance decision pipeline.
//!
//! Combines the spoof tripwires, geofence evaluation and the subject's policy
//! flags into an accept/reject decision for a single check-in or check-out.
//! Order matters: a spoofed reading is rejected before any zone is looked at.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::geodesy::Coordinate;
use uuid::Uuid;

use super::geofence::{EvaluationResult, GeofenceCheck, GeofenceEvaluator};
use super::spoof_detection::{
    SpoofCheck, SpoofDetector, SpoofSignal, SpoofThresholds, SpoofVerdict,
};
use crate::models::location::LocationPing;
use crate::models::subject::Subject;
use crate::models::zone::ZoneDefinition;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    SuspiciousGps,
    OutsideGeofence,
    FaceMismatch,
}

impl RejectionReason {
    /// User-facing explanation.
    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::SuspiciousGps => "suspicious GPS activity",
            RejectionReason::OutsideGeofence => "outside allowed geofence area",
            RejectionReason::FaceMismatch => "face verification failed",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDecision {
    pub accept: bool,
    pub reason: Option<RejectionReason>,
    /// `None` when the geofence was never evaluated.
    pub inside_any: Option<bool>,
    pub distance_meters: Option<f64>,
    pub nearest_zone_id: Option<Uuid>,
    /// Set when the spoof tripwire fired; audited through a tracking alert.
    pub is_anomaly: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spoof_signals: Vec<SpoofSignal>,
    /// Movement since the prior ping, carried when the spoof tripwire fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
}

impl AttendanceDecision {
    /// Rejection decided before location checks ran.
    pub fn rejected(reason: RejectionReason) -> Self {
        Self {
            accept: false,
            reason: Some(reason),
            inside_any: None,
            distance_meters: None,
            nearest_zone_id: None,
            is_anomaly: false,
            spoof_signals: Vec::new(),
            jump_meters: None,
            speed_mps: None,
        }
    }

    fn spoofed(verdict: SpoofVerdict) -> Self {
        Self {
            is_anomaly: true,
            spoof_signals: verdict.signals,
            jump_meters: verdict.distance_meters,
            speed_mps: verdict.speed_mps,
            ..Self::rejected(RejectionReason::SuspiciousGps)
        }
    }

    fn from_evaluation(evaluation: &EvaluationResult, allow_outside: bool) -> Self {
        let accept = evaluation.inside_any || allow_outside;
        Self {
            accept,
            reason: (!accept).then_some(RejectionReason::OutsideGeofence),
            inside_any: Some(evaluation.inside_any),
            distance_meters: evaluation.nearest_distance_meters,
            nearest_zone_id: evaluation.nearest_zone.as_ref().map(|z| z.id),
            is_anomaly: false,
            spoof_signals: Vec::new(),
            jump_meters: None,
            speed_mps: None,
        }
    }
}

/// Stateless pipeline over a geofence check and a spoof check.
#[derive(Debug, Clone, Default)]
pub struct AttendanceDecisionPipeline<G = GeofenceEvaluator, S = SpoofDetector> {
    geofence: G,
    spoof: S,
}

impl AttendanceDecisionPipeline {
    pub fn new(thresholds: SpoofThresholds) -> Self {
        Self::with_checks(GeofenceEvaluator, SpoofDetector::new(thresholds))
    }
}

impl<G: GeofenceCheck, S: SpoofCheck> AttendanceDecisionPipeline<G, S> {
    pub fn with_checks(geofence: G, spoof: S) -> Self {
        Self { geofence, spoof }
    }

    pub fn geofence(&self) -> &G {
        &self.geofence
    }

    pub fn spoof(&self) -> &S {
        &self.spoof
    }

    /// Decides one attendance attempt.
    ///
    /// `zones` is the subject's effective zone set and `prior` its latest ping
    /// from any session.
    pub fn decide(
        &self,
        subject: &Subject,
        zones: &[ZoneDefinition],
        prior: Option<&LocationPing>,
        at: Coordinate,
        now: DateTime<Utc>,
    ) -> AttendanceDecision {
        if subject.policy.spoof_check_enabled {
            let verdict = self.spoof.check(prior, at, now);
            if verdict.is_spoofed {
                return AttendanceDecision::spoofed(verdict);
            }
        }

        let evaluation = self.geofence.evaluate(zones, at);
        AttendanceDecision::from_evaluation(&evaluation, subject.policy.allow_outside_geofence)
    }
}

/// Decides with the default evaluator and thresholds.
pub fn decide(
    subject: &Subject,
    zones: &[ZoneDefinition],
    prior: Option<&LocationPing>,
    at: Coordinate,
    now: DateTime<Utc>,
) -> AttendanceDecision {
    AttendanceDecisionPipeline::new(SpoofThresholds::default())
        .decide(subject, zones, prior, at, now)
}
