//! Domain services for attendance.
//!
//! The geofence, spoof and decision modules are pure; `attendance` adds the
//! I/O around them through the traits in `ports`.

pub mod attendance;
pub mod attendance_decision;
pub mod geofence;
pub mod memory;
pub mod ports;
pub mod spoof_detection;

pub use attendance::{
    AttendanceCommand, AttendanceError, AttendanceOutcome, AttendanceService, AttendanceSettings,
    Collaborators, LocationCommand, TrackingOutcome,
};
pub use attendance_decision::{
    decide, AttendanceDecision, AttendanceDecisionPipeline, RejectionReason,
};
pub use geofence::{EvaluationResult, GeofenceCheck, GeofenceEvaluator, SkippedZone};
pub use memory::{
    DirectorySnapshot, InMemoryAlertSink, InMemoryAttendanceStore, InMemoryDirectory,
    InMemoryLocationHistory, ZoneAssignment,
};
pub use ports::{
    AlertSink, AttendanceStore, DisabledFaceMatcher, FaceMatchOutcome, FaceMatcher,
    LocationHistory, StoreError, SubjectDirectory,
};
pub use spoof_detection::{
    check_spoofed, SpoofCheck, SpoofDetector, SpoofSignal, SpoofThresholds, SpoofVerdict,
};
