//! Collaborator ports used by the attendance service.
//!
//! Storage and face verification live outside this crate; these traits are
//! the contracts they satisfy.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::attendance::{AttendanceKind, AttendanceRecord};
use crate::models::location::LocationPing;
use crate::models::subject::Subject;
use crate::models::tracking_alert::TrackingAlert;
use crate::models::zone::ZoneDefinition;

/// Failure reported by a storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A record with the same unique key already exists.
    #[error("Conflicting record: {0}")]
    Conflict(String),
}

/// Source of subjects and their effective zone sets.
#[async_trait::async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find_subject(&self, subject_id: Uuid) -> Result<Option<Subject>, StoreError>;

    /// Direct zones ∪ unit zones, deduplicated by id.
    async fn effective_zones(&self, subject: &Subject) -> Result<Vec<ZoneDefinition>, StoreError>;
}

/// Append-only ping history.
#[async_trait::async_trait]
pub trait LocationHistory: Send + Sync {
    /// Most recent ping for the subject across all sessions.
    async fn latest_ping(&self, subject_id: Uuid) -> Result<Option<LocationPing>, StoreError>;

    async fn append_ping(&self, ping: LocationPing) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_for_day(
        &self,
        subject_id: Uuid,
        day: NaiveDate,
        kind: AttendanceKind,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Stores a record. At most one record per (subject, UTC day, kind);
    /// a second one fails with [`StoreError::Conflict`].
    async fn save(&self, record: AttendanceRecord) -> Result<AttendanceRecord, StoreError>;
}

#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    async fn raise(&self, alert: TrackingAlert) -> Result<(), StoreError>;
}

/// Result of asking the face-match collaborator about a photo.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaceMatchOutcome {
    Matched { confidence: f64 },
    Mismatched { confidence: f64 },
    /// Verification was not attempted.
    Skipped,
    /// The service could not give an answer.
    Unavailable { message: String },
}

impl FaceMatchOutcome {
    /// `Some(true/false)` when the service answered.
    pub fn verified(&self) -> Option<bool> {
        match self {
            FaceMatchOutcome::Matched { .. } => Some(true),
            FaceMatchOutcome::Mismatched { .. } => Some(false),
            FaceMatchOutcome::Skipped | FaceMatchOutcome::Unavailable { .. } => None,
        }
    }
}

/// Opaque face verification collaborator.
#[async_trait::async_trait]
pub trait FaceMatcher: Send + Sync {
    async fn verify(&self, subject_id: Uuid, image_base64: &str) -> FaceMatchOutcome;
}

/// Face matcher used when verification is switched off.
#[derive(Debug, Clone, Default)]
pub struct DisabledFaceMatcher;

#[async_trait::async_trait]
impl FaceMatcher for DisabledFaceMatcher {
    async fn verify(&self, subject_id: Uuid, _image_base64: &str) -> FaceMatchOutcome {
        tracing::debug!(subject_id = %subject_id, "Face matching disabled, skipping verification");
        FaceMatchOutcome::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_match_outcome_verified() {
        assert_eq!(FaceMatchOutcome::Matched { confidence: 0.9 }.verified(), Some(true));
        assert_eq!(
            FaceMatchOutcome::Mismatched { confidence: 0.2 }.verified(),
            Some(false)
        );
        assert_eq!(FaceMatchOutcome::Skipped.verified(), None);
        assert_eq!(
            FaceMatchOutcome::Unavailable {
                message: "timeout".into()
            }
            .verified(),
            None
        );
    }

    #[test]
    fn test_face_match_outcome_serialization() {
        let json = serde_json::to_value(FaceMatchOutcome::Matched { confidence: 0.87 }).unwrap();
        assert_eq!(json["status"], "matched");
        assert_eq!(json["confidence"], 0.87);
    }

    #[tokio::test]
    async fn test_disabled_face_matcher_skips() {
        let outcome = DisabledFaceMatcher.verify(Uuid::new_v4(), "aGVsbG8=").await;
        assert_eq!(outcome, FaceMatchOutcome::Skipped);
    }
}
